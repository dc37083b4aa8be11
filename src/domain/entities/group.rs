use thiserror::Error;

use crate::domain::entities::meter::{MeterId, MeterSet};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub i64);

impl From<i64> for GroupId {
    fn from(value: i64) -> Self {
        GroupId(value)
    }
}

impl From<GroupId> for i64 {
    fn from(value: GroupId) -> Self {
        value.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterGroup {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub customer_id: Option<String>,
    pub meter_ids: MeterSet,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub customer_id: Option<String>,
    pub meter_ids: Vec<MeterId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub add_meter_ids: Vec<MeterId>,
    pub remove_meter_ids: Vec<MeterId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("group name is required")]
    EmptyName,
    #[error("group name must be at most {} characters", MAX_NAME_LEN)]
    NameTooLong,
    #[error("description must be at most {} characters", MAX_DESCRIPTION_LEN)]
    DescriptionTooLong,
    #[error("select at least one meter")]
    NoMeters,
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(())
}

impl NewGroup {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_description(&self.description)?;
        if self.meter_ids.is_empty() {
            return Err(ValidationError::NoMeters);
        }
        Ok(())
    }
}

impl GroupUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.add_meter_ids.is_empty()
            && self.remove_meter_ids.is_empty()
    }
}

/// Membership change between a stored group and an edited id list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    pub added: MeterSet,
    pub removed: MeterSet,
}

impl MembershipDiff {
    pub fn between(existing: &MeterSet, updated: &MeterSet) -> Self {
        Self {
            added: updated.difference(existing).copied().collect(),
            removed: existing.difference(updated).copied().collect(),
        }
    }

    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u64]) -> MeterSet {
        values.iter().filter_map(|v| MeterId::new(*v)).collect()
    }

    #[test]
    fn membership_diff_splits_added_and_removed() {
        let diff = MembershipDiff::between(&ids(&[1, 2, 3]), &ids(&[2, 3, 4]));

        assert_eq!(diff.added, ids(&[4]));
        assert_eq!(diff.removed, ids(&[1]));
        assert!(diff.changed());
        assert!(!MembershipDiff::between(&ids(&[1]), &ids(&[1])).changed());
    }

    #[test]
    fn new_group_requires_name_and_meters() {
        let mut group = NewGroup {
            name: "  ".to_string(),
            description: String::new(),
            created_by: "ops@example.com".to_string(),
            customer_id: None,
            meter_ids: ids(&[1]).into_iter().collect(),
        };
        assert_eq!(group.validate(), Err(ValidationError::EmptyName));

        group.name = "North".to_string();
        assert_eq!(group.validate(), Ok(()));

        group.meter_ids.clear();
        assert_eq!(group.validate(), Err(ValidationError::NoMeters));
    }

    #[test]
    fn update_checks_only_provided_fields() {
        let update = GroupUpdate {
            description: Some("x".repeat(MAX_DESCRIPTION_LEN + 1)),
            ..GroupUpdate::default()
        };
        assert_eq!(update.validate(), Err(ValidationError::DescriptionTooLong));
        assert!(GroupUpdate::default().validate().is_ok());
        assert!(GroupUpdate::default().is_empty());
    }
}
