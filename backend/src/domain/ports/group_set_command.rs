//! Driving port for group set mutations.
//!
//! Requests carry raw payload values. Services authorize the caller first and
//! only then validate the payload, so a denied caller learns nothing about
//! whether their input would have been accepted.

use async_trait::async_trait;

use crate::domain::{Error, GroupSet, GroupSetId, UnitId, UserId};

/// Raw group set fields accepted on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSetInput {
    pub name: String,
    pub allow_students_to_create_groups: Option<bool>,
    pub allow_students_to_manage_groups: Option<bool>,
    pub keep_groups_in_same_class: Option<bool>,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupSetRequest {
    pub actor: UserId,
    pub unit_id: UnitId,
    pub group_set: GroupSetInput,
}

/// Raw partial update. For `capacity`, `Some(None)` clears the cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSetUpdate {
    pub name: Option<String>,
    pub allow_students_to_create_groups: Option<bool>,
    pub allow_students_to_manage_groups: Option<bool>,
    pub keep_groups_in_same_class: Option<bool>,
    pub capacity: Option<Option<u32>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateGroupSetRequest {
    pub actor: UserId,
    pub unit_id: UnitId,
    pub group_set_id: GroupSetId,
    pub changes: GroupSetUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteGroupSetRequest {
    pub actor: UserId,
    pub unit_id: UnitId,
    pub group_set_id: GroupSetId,
}

/// Driving port for group set write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupSetCommand: Send + Sync {
    /// Create a group set in a unit. Convenors only.
    async fn create_group_set(&self, request: CreateGroupSetRequest) -> Result<GroupSet, Error>;

    /// Change name, policy flags or capacity. Convenors only.
    async fn update_group_set(&self, request: UpdateGroupSetRequest) -> Result<GroupSet, Error>;

    /// Delete a group set with all of its groups. Convenors only.
    async fn delete_group_set(&self, request: DeleteGroupSetRequest) -> Result<(), Error>;
}
