use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::entities::group::{
    GroupId, GroupUpdate, MembershipDiff, MeterGroup, NewGroup, ValidationError,
};
use crate::domain::entities::meter::{join_meter_ids, MeterId, MeterSet};
use crate::domain::reconcile::{FormMode, MeterSelection};
use crate::usecase::ports::repo::{GroupRepository, GroupSummary, RepoError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("a create session cannot update group {0}")]
    NotAnEditSession(GroupId),
    #[error("nothing to update in group {0}")]
    NoChanges(GroupId),
}

/// Scalar fields of the group form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupForm {
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub customer_id: Option<String>,
}

/// Field changes of an edit submit. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupEdits {
    pub name: Option<String>,
    pub description: Option<String>,
    pub remove_meter_ids: Vec<MeterId>,
}

pub struct GroupService {
    repo: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(repo: Arc<dyn GroupRepository>) -> Self {
        Self { repo }
    }

    pub fn init(&self) -> Result<(), ServiceError> {
        Ok(self.repo.init()?)
    }

    pub fn list(&self) -> Result<Vec<GroupSummary>, ServiceError> {
        Ok(self.repo.list_groups()?)
    }

    pub fn get(&self, id: GroupId) -> Result<MeterGroup, ServiceError> {
        Ok(self.repo.get_group(id)?)
    }

    pub fn delete(&self, id: GroupId) -> Result<(), ServiceError> {
        self.repo.delete_group(id)?;
        info!(group_id = %id, "group deleted");
        Ok(())
    }

    /// Loads a group and snapshots its membership for an edit session.
    pub fn open_edit_session(
        &self,
        id: GroupId,
    ) -> Result<(MeterGroup, MeterSelection), ServiceError> {
        let group = self.repo.get_group(id)?;
        let selection = MeterSelection::edit(group.meter_ids.clone());
        Ok((group, selection))
    }

    pub fn create_from_session(
        &self,
        form: GroupForm,
        selection: &MeterSelection,
    ) -> Result<GroupId, ServiceError> {
        let group = NewGroup {
            name: form.name,
            description: form.description,
            created_by: form.created_by,
            customer_id: form.customer_id,
            meter_ids: selection.view().submitted_ids(),
        };
        group.validate()?;

        let meter_count = group.meter_ids.len();
        let id = self.repo.create_group(group)?;
        info!(group_id = %id, meters = meter_count, "group created");
        Ok(id)
    }

    /// Applies an edit submit: the session's new ids are added, explicit
    /// removals are limited to ids the group actually holds.
    pub fn update_from_session(
        &self,
        id: GroupId,
        edits: GroupEdits,
        selection: &MeterSelection,
    ) -> Result<GroupUpdate, ServiceError> {
        if selection.mode() != FormMode::Edit {
            return Err(ServiceError::NotAnEditSession(id));
        }

        let existing = selection.existing();
        let (remove_meter_ids, unknown): (MeterSet, MeterSet) = edits
            .remove_meter_ids
            .into_iter()
            .partition(|meter_id| existing.contains(meter_id));
        if !unknown.is_empty() {
            warn!(
                group_id = %id,
                "not removing meters outside the group: {}",
                join_meter_ids(&unknown)
            );
        }

        let target: MeterSet = existing
            .union(&selection.view().new_ids)
            .filter(|meter_id| !remove_meter_ids.contains(meter_id))
            .copied()
            .collect();
        let diff = MembershipDiff::between(existing, &target);

        let update = GroupUpdate {
            name: edits.name,
            description: edits.description,
            add_meter_ids: diff.added.into_iter().collect(),
            remove_meter_ids: diff.removed.into_iter().collect(),
        };
        update.validate()?;
        if update.is_empty() {
            return Err(ServiceError::NoChanges(id));
        }

        self.repo.update_group(id, update.clone())?;
        info!(
            group_id = %id,
            added = update.add_meter_ids.len(),
            removed = update.remove_meter_ids.len(),
            "group updated"
        );
        Ok(update)
    }
}
