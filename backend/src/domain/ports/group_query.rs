//! Driving port for group reads.

use async_trait::async_trait;

use crate::domain::{Error, GroupSummary, ProjectId, UnitId, UserId};

use super::{GroupPath, GroupSetPath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUnitGroupsRequest {
    pub actor: UserId,
    pub unit_id: UnitId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListGroupsRequest {
    pub actor: UserId,
    pub path: GroupSetPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetGroupRequest {
    pub actor: UserId,
    pub path: GroupPath,
}

/// Driving port for group read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupQuery: Send + Sync {
    /// Every group in the unit. Staff only.
    async fn list_unit_groups(
        &self,
        request: ListUnitGroupsRequest,
    ) -> Result<Vec<GroupSummary>, Error>;

    /// Groups of one group set. Staff only.
    async fn list_groups(&self, request: ListGroupsRequest) -> Result<Vec<GroupSummary>, Error>;

    /// One group, visible to staff and its members.
    async fn get_group(&self, request: GetGroupRequest) -> Result<GroupSummary, Error>;

    /// Project ids of a group's members, visible to staff and members.
    async fn list_members(&self, request: GetGroupRequest) -> Result<Vec<ProjectId>, Error>;
}
