//! Driving port for group set reads.

use async_trait::async_trait;

use crate::domain::{Error, GroupSet, UnitId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListGroupSetsRequest {
    pub actor: UserId,
    pub unit_id: UnitId,
}

/// Driving port for group set read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupSetQuery: Send + Sync {
    /// Group sets of a unit, visible to its staff and students.
    async fn list_group_sets(&self, request: ListGroupSetsRequest) -> Result<Vec<GroupSet>, Error>;
}
