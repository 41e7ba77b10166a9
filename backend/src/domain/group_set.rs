//! Group sets: named collections of groups inside a unit.
//!
//! A group set carries the policy flags that decide how much students may do
//! on their own. The owning unit is fixed at creation.

use serde::{Deserialize, Serialize};

use super::ids::{GroupSetId, UnitId};

/// Maximum length of a group set or group name.
pub const NAME_MAX: usize = 100;

/// Validation failures raised while building or changing a group set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupSetValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("capacity must be at least 1")]
    ZeroCapacity,
}

/// Trimmed, bounded group set name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupSetName(String);

impl GroupSetName {
    /// Validate a raw name.
    ///
    /// # Examples
    /// ```
    /// use groups_backend::domain::GroupSetName;
    ///
    /// let name = GroupSetName::new("  Assignment 1 teams ").expect("valid name");
    /// assert_eq!(name.as_ref(), "Assignment 1 teams");
    /// assert!(GroupSetName::new("   ").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, GroupSetValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GroupSetValidationError::EmptyName);
        }
        if trimmed.chars().count() > NAME_MAX {
            return Err(GroupSetValidationError::NameTooLong { max: NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Case-insensitive comparison key used for uniqueness within a unit.
    pub fn uniqueness_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for GroupSetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<GroupSetName> for String {
    fn from(value: GroupSetName) -> Self {
        value.0
    }
}

impl TryFrom<String> for GroupSetName {
    type Error = GroupSetValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Student self-service flags. All default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSetPolicy {
    pub allow_students_to_create_groups: bool,
    pub allow_students_to_manage_groups: bool,
    pub keep_groups_in_same_class: bool,
}

/// Optional per-group member cap shared by every group in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct GroupCapacity(u32);

impl GroupCapacity {
    pub fn new(value: u32) -> Result<Self, GroupSetValidationError> {
        if value == 0 {
            return Err(GroupSetValidationError::ZeroCapacity);
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<GroupCapacity> for u32 {
    fn from(value: GroupCapacity) -> Self {
        value.0
    }
}

impl TryFrom<u32> for GroupCapacity {
    type Error = GroupSetValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validated creation input for a group set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroupSet {
    pub name: GroupSetName,
    pub policy: GroupSetPolicy,
    pub capacity: Option<GroupCapacity>,
}

/// Partial update of a group set. `None` leaves a field unchanged; for
/// `capacity`, `Some(None)` clears the cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSetChanges {
    pub name: Option<GroupSetName>,
    pub allow_students_to_create_groups: Option<bool>,
    pub allow_students_to_manage_groups: Option<bool>,
    pub keep_groups_in_same_class: Option<bool>,
    pub capacity: Option<Option<GroupCapacity>>,
}

/// A group set within a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSet {
    id: GroupSetId,
    unit_id: UnitId,
    name: GroupSetName,
    policy: GroupSetPolicy,
    capacity: Option<GroupCapacity>,
}

impl GroupSet {
    /// Create a group set in `unit_id`.
    pub fn create(id: GroupSetId, unit_id: UnitId, input: NewGroupSet) -> Self {
        let NewGroupSet {
            name,
            policy,
            capacity,
        } = input;
        Self {
            id,
            unit_id,
            name,
            policy,
            capacity,
        }
    }

    pub fn id(&self) -> GroupSetId {
        self.id
    }

    /// Owning unit. Never changes after creation.
    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    pub fn name(&self) -> &GroupSetName {
        &self.name
    }

    pub fn policy(&self) -> GroupSetPolicy {
        self.policy
    }

    pub fn capacity(&self) -> Option<GroupCapacity> {
        self.capacity
    }

    pub fn allows_students_to_create_groups(&self) -> bool {
        self.policy.allow_students_to_create_groups
    }

    pub fn allows_students_to_manage_groups(&self) -> bool {
        self.policy.allow_students_to_manage_groups
    }

    pub fn keeps_groups_in_same_class(&self) -> bool {
        self.policy.keep_groups_in_same_class
    }

    /// Apply a partial update. The unit reference is not part of
    /// [`GroupSetChanges`] and so cannot move.
    pub fn apply(&mut self, changes: GroupSetChanges) {
        let GroupSetChanges {
            name,
            allow_students_to_create_groups,
            allow_students_to_manage_groups,
            keep_groups_in_same_class,
            capacity,
        } = changes;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(flag) = allow_students_to_create_groups {
            self.policy.allow_students_to_create_groups = flag;
        }
        if let Some(flag) = allow_students_to_manage_groups {
            self.policy.allow_students_to_manage_groups = flag;
        }
        if let Some(flag) = keep_groups_in_same_class {
            self.policy.keep_groups_in_same_class = flag;
        }
        if let Some(capacity) = capacity {
            self.capacity = capacity;
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn group_set() -> GroupSet {
        GroupSet::create(
            GroupSetId::random(),
            UnitId::random(),
            NewGroupSet {
                name: GroupSetName::new("Teams").expect("valid name"),
                policy: GroupSetPolicy::default(),
                capacity: None,
            },
        )
    }

    #[rstest]
    fn policy_flags_default_to_false(group_set: GroupSet) {
        assert!(!group_set.allows_students_to_create_groups());
        assert!(!group_set.allows_students_to_manage_groups());
        assert!(!group_set.keeps_groups_in_same_class());
    }

    #[rstest]
    fn rejects_overlong_names() {
        let raw = "n".repeat(NAME_MAX + 1);
        assert_eq!(
            GroupSetName::new(raw).expect_err("too long"),
            GroupSetValidationError::NameTooLong { max: NAME_MAX }
        );
    }

    #[rstest]
    fn uniqueness_key_ignores_case() {
        let a = GroupSetName::new("Project Teams").expect("valid");
        let b = GroupSetName::new("project teams").expect("valid");
        assert_eq!(a.uniqueness_key(), b.uniqueness_key());
    }

    #[rstest]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            GroupCapacity::new(0).expect_err("zero"),
            GroupSetValidationError::ZeroCapacity
        );
    }

    #[rstest]
    fn apply_updates_only_supplied_fields(mut group_set: GroupSet) {
        let unit = group_set.unit_id();
        group_set.apply(GroupSetChanges {
            allow_students_to_manage_groups: Some(true),
            capacity: Some(Some(GroupCapacity::new(4).expect("valid"))),
            ..GroupSetChanges::default()
        });

        assert_eq!(group_set.name().as_ref(), "Teams");
        assert!(group_set.allows_students_to_manage_groups());
        assert!(!group_set.allows_students_to_create_groups());
        assert_eq!(group_set.capacity().map(GroupCapacity::get), Some(4));
        assert_eq!(group_set.unit_id(), unit);
    }

    #[rstest]
    fn apply_can_clear_capacity(mut group_set: GroupSet) {
        group_set.apply(GroupSetChanges {
            capacity: Some(Some(GroupCapacity::new(3).expect("valid"))),
            ..GroupSetChanges::default()
        });
        group_set.apply(GroupSetChanges {
            capacity: Some(None),
            ..GroupSetChanges::default()
        });
        assert!(group_set.capacity().is_none());
    }
}
