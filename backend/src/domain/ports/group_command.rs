//! Driving port for group and membership mutations.

use async_trait::async_trait;

use crate::domain::{Error, GroupId, GroupSetId, GroupSummary, ProjectId, UnitId, UserId};

/// Path of a group set below its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSetPath {
    pub unit_id: UnitId,
    pub group_set_id: GroupSetId,
}

/// Path of a group below its unit and group set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPath {
    pub unit_id: UnitId,
    pub group_set_id: GroupSetId,
    pub group_id: GroupId,
}

impl GroupPath {
    pub fn group_set(self) -> GroupSetPath {
        GroupSetPath {
            unit_id: self.unit_id,
            group_set_id: self.group_set_id,
        }
    }
}

/// Raw group fields accepted on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupInput {
    pub name: String,
    /// Unparsed tutorial id. Students may omit this to use their own
    /// tutorial.
    pub tutorial_id: Option<String>,
    pub capacity_adjustment: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupRequest {
    pub actor: UserId,
    pub path: GroupSetPath,
    pub group: GroupInput,
}

/// Raw partial update. Each present field is authorized separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupUpdate {
    pub name: Option<String>,
    /// Unparsed, so a malformed id is reported only after authorization.
    pub tutorial_id: Option<String>,
    pub capacity_adjustment: Option<i32>,
    pub locked: Option<bool>,
}

impl GroupUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.tutorial_id.is_none()
            && self.capacity_adjustment.is_none()
            && self.locked.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateGroupRequest {
    pub actor: UserId,
    pub path: GroupPath,
    pub changes: GroupUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteGroupRequest {
    pub actor: UserId,
    pub path: GroupPath,
}

/// Add or remove one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRequest {
    pub actor: UserId,
    pub path: GroupPath,
    pub project_id: ProjectId,
}

/// Driving port for group write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupCommand: Send + Sync {
    /// Create an unlocked group. Student creators become its first member.
    async fn create_group(&self, request: CreateGroupRequest) -> Result<GroupSummary, Error>;

    /// Rename, move tutorial, adjust capacity or change the lock state.
    async fn update_group(&self, request: UpdateGroupRequest) -> Result<GroupSummary, Error>;

    async fn delete_group(&self, request: DeleteGroupRequest) -> Result<(), Error>;

    async fn add_member(&self, request: MemberRequest) -> Result<GroupSummary, Error>;

    async fn remove_member(&self, request: MemberRequest) -> Result<(), Error>;
}
