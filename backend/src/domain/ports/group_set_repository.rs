//! Port for group set persistence.

use async_trait::async_trait;

use crate::domain::{GroupSet, GroupSetId, UnitId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by group set repository adapters.
    pub enum GroupSetRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "group set repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "group set repository query failed: {message}",
        /// Another group set in the unit already uses the name.
        DuplicateName { name: String } => "group set name already in use: {name}",
    }
}

/// Storage for group sets. Deleting a set removes its groups and their
/// memberships in the same transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupSetRepository: Send + Sync {
    /// Group sets of a unit, ordered by name.
    async fn list_for_unit(&self, unit_id: &UnitId)
    -> Result<Vec<GroupSet>, GroupSetRepositoryError>;

    async fn find(&self, id: &GroupSetId) -> Result<Option<GroupSet>, GroupSetRepositoryError>;

    /// Insert a new group set, enforcing case-insensitive name uniqueness
    /// within its unit.
    async fn insert(&self, group_set: &GroupSet) -> Result<(), GroupSetRepositoryError>;

    /// Persist changed fields of an existing group set.
    async fn update(&self, group_set: &GroupSet) -> Result<(), GroupSetRepositoryError>;

    /// Delete a group set. Returns `false` when nothing was deleted.
    async fn delete(&self, id: &GroupSetId) -> Result<bool, GroupSetRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn duplicate_name_error_formats_message() {
        let err = GroupSetRepositoryError::duplicate_name("Teams");
        assert_eq!(err.to_string(), "group set name already in use: Teams");
    }
}
