use thiserror::Error;

use crate::domain::entities::group::{GroupId, GroupUpdate, MeterGroup, NewGroup};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("group {0} not found")]
    NotFound(GroupId),
    #[error("{0}")]
    Message(String),
}

impl From<anyhow::Error> for RepoError {
    fn from(err: anyhow::Error) -> Self {
        RepoError::Message(format!("{err:#}"))
    }
}

pub trait GroupRepository: Send + Sync {
    fn init(&self) -> Result<(), RepoError>;

    fn list_groups(&self) -> Result<Vec<GroupSummary>, RepoError>;
    fn get_group(&self, id: GroupId) -> Result<MeterGroup, RepoError>;

    fn create_group(&self, group: NewGroup) -> Result<GroupId, RepoError>;
    fn update_group(&self, id: GroupId, update: GroupUpdate) -> Result<(), RepoError>;
    fn delete_group(&self, id: GroupId) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub meter_count: i64,
    pub updated_at: String,
}
