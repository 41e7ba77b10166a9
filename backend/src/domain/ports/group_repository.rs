//! Port for group and membership persistence.

use async_trait::async_trait;

use crate::domain::{Group, GroupDraft, GroupId, GroupSetId, GroupSummary, ProjectId, UnitId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by group repository adapters.
    pub enum GroupRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "group repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "group repository query failed: {message}",
        /// Another group in the set already uses the name.
        DuplicateName { name: String } => "group name already in use: {name}",
        /// The project already belongs to a group of the same set.
        AlreadyInGroupSet { project_id: ProjectId } =>
            "project {project_id} is already in a group of this group set",
    }
}

/// Storage for groups and their members.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Groups of one group set, ordered by number.
    async fn list_for_group_set(
        &self,
        group_set_id: &GroupSetId,
    ) -> Result<Vec<GroupSummary>, GroupRepositoryError>;

    /// Groups across every group set of a unit.
    async fn list_for_unit(&self, unit_id: &UnitId)
    -> Result<Vec<GroupSummary>, GroupRepositoryError>;

    async fn find(&self, id: &GroupId) -> Result<Option<GroupSummary>, GroupRepositoryError>;

    /// Number and insert a draft in one transaction. When `first_member` is
    /// given it is added in the same transaction.
    async fn create(
        &self,
        draft: GroupDraft,
        first_member: Option<ProjectId>,
    ) -> Result<Group, GroupRepositoryError>;

    /// Persist changed fields of an existing group.
    async fn update(&self, group: &Group) -> Result<(), GroupRepositoryError>;

    /// Delete a group and its memberships. Returns `false` when nothing was
    /// deleted.
    async fn delete(&self, id: &GroupId) -> Result<bool, GroupRepositoryError>;

    /// Project ids of the group's members.
    async fn members(&self, id: &GroupId) -> Result<Vec<ProjectId>, GroupRepositoryError>;

    /// Group of `group_set_id` that holds `project_id`, if any.
    async fn group_of_project(
        &self,
        group_set_id: &GroupSetId,
        project_id: &ProjectId,
    ) -> Result<Option<GroupId>, GroupRepositoryError>;

    /// Add a member. Fails with `AlreadyInGroupSet` when the project joined
    /// another group of the set concurrently.
    async fn add_member(
        &self,
        id: &GroupId,
        project_id: &ProjectId,
    ) -> Result<(), GroupRepositoryError>;

    /// Remove a member. Returns `false` when the project was not a member.
    async fn remove_member(
        &self,
        id: &GroupId,
        project_id: &ProjectId,
    ) -> Result<bool, GroupRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn already_in_group_set_error_names_project() {
        let project_id = ProjectId::random();
        let err = GroupRepositoryError::already_in_group_set(project_id);
        assert!(err.to_string().contains(&project_id.to_string()));
    }
}
