use std::path::PathBuf;

use crate::domain::entities::group::{GroupId, GroupUpdate, MeterGroup, NewGroup};
use crate::infra::sqlite::queries::{
    create_group, delete_group, list_groups, load_group, update_group,
};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::repo::{GroupRepository, GroupSummary, RepoError};

pub struct SqliteRepo {
    pub db_path: PathBuf,
}

impl SqliteRepo {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}

impl GroupRepository for SqliteRepo {
    fn init(&self) -> Result<(), RepoError> {
        init_db(&self.db_path).map_err(RepoError::from)
    }

    fn list_groups(&self) -> Result<Vec<GroupSummary>, RepoError> {
        list_groups(&self.db_path).map_err(RepoError::from)
    }

    fn get_group(&self, id: GroupId) -> Result<MeterGroup, RepoError> {
        load_group(&self.db_path, id.0)?.ok_or(RepoError::NotFound(id))
    }

    fn create_group(&self, group: NewGroup) -> Result<GroupId, RepoError> {
        let group_id = create_group(&self.db_path, &group)?;
        Ok(GroupId(group_id))
    }

    fn update_group(&self, id: GroupId, update: GroupUpdate) -> Result<(), RepoError> {
        if update_group(&self.db_path, id.0, &update)? {
            Ok(())
        } else {
            Err(RepoError::NotFound(id))
        }
    }

    fn delete_group(&self, id: GroupId) -> Result<(), RepoError> {
        if delete_group(&self.db_path, id.0)? {
            Ok(())
        } else {
            Err(RepoError::NotFound(id))
        }
    }
}
