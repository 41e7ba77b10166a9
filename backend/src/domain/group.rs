//! Groups within a group set, including the lock state machine.

use serde::{Deserialize, Serialize};

use super::group_set::{GroupSet, NAME_MAX};
use super::ids::{GroupId, GroupSetId, TutorialId, UnitId};
use super::unit::Tutorial;

/// Validation failures raised while building or changing a group.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("tutorial {tutorial} does not belong to unit {unit}")]
    TutorialOutsideUnit { tutorial: TutorialId, unit: UnitId },
    #[error("group number must be at least 1")]
    ZeroNumber,
}

/// Trimmed, bounded group name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, GroupValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GroupValidationError::EmptyName);
        }
        if trimmed.chars().count() > NAME_MAX {
            return Err(GroupValidationError::NameTooLong { max: NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Case-insensitive comparison key used for uniqueness within a set.
    pub fn uniqueness_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for GroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<GroupName> for String {
    fn from(value: GroupName) -> Self {
        value.0
    }
}

impl TryFrom<String> for GroupName {
    type Error = GroupValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lock states a group moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Unlocked,
    Locked,
}

impl LockState {
    pub fn from_locked(locked: bool) -> Self {
        if locked { Self::Locked } else { Self::Unlocked }
    }

    pub fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// Outcome of requesting a lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    Locked,
    Unlocked,
    /// The group was already in the requested state.
    Unchanged,
}

/// Validated creation input for a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: GroupName,
    pub tutorial_id: TutorialId,
    pub capacity_adjustment: i32,
}

/// Stored representation used by repositories to rebuild a [`Group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParts {
    pub id: GroupId,
    pub group_set_id: GroupSetId,
    pub tutorial_id: TutorialId,
    pub name: GroupName,
    pub number: u32,
    pub locked: bool,
    pub capacity_adjustment: i32,
}

/// A student team inside a group set.
///
/// ## Invariants
/// - `number` is at least 1 and unique within the group set.
/// - The tutorial belongs to the same unit as the group set; checked by
///   [`GroupDraft::new`] and [`Group::change_tutorial`].
/// - New groups start unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    id: GroupId,
    group_set_id: GroupSetId,
    tutorial_id: TutorialId,
    name: GroupName,
    number: u32,
    lock: LockState,
    capacity_adjustment: i32,
}

/// A validated group awaiting its number.
///
/// Repositories assign the number inside the same transaction that inserts
/// the row, then call [`GroupDraft::into_group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDraft {
    id: GroupId,
    group_set_id: GroupSetId,
    input: NewGroup,
}

impl GroupDraft {
    /// Validate a new group for `group_set`, taught in `tutorial`.
    pub fn new(
        id: GroupId,
        group_set: &GroupSet,
        tutorial: &Tutorial,
        input: NewGroup,
    ) -> Result<Self, GroupValidationError> {
        ensure_same_unit(group_set, tutorial)?;
        Ok(Self {
            id,
            group_set_id: group_set.id(),
            input: NewGroup {
                tutorial_id: tutorial.id,
                ..input
            },
        })
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn group_set_id(&self) -> GroupSetId {
        self.group_set_id
    }

    pub fn name(&self) -> &GroupName {
        &self.input.name
    }

    pub fn tutorial_id(&self) -> TutorialId {
        self.input.tutorial_id
    }

    pub fn capacity_adjustment(&self) -> i32 {
        self.input.capacity_adjustment
    }

    /// Number the draft. New groups always start unlocked.
    pub fn into_group(self, number: u32) -> Result<Group, GroupValidationError> {
        if number == 0 {
            return Err(GroupValidationError::ZeroNumber);
        }
        Ok(Group {
            id: self.id,
            group_set_id: self.group_set_id,
            tutorial_id: self.input.tutorial_id,
            name: self.input.name,
            number,
            lock: LockState::Unlocked,
            capacity_adjustment: self.input.capacity_adjustment,
        })
    }
}

impl Group {
    /// Rebuild a group from stored parts.
    pub fn from_parts(parts: GroupParts) -> Self {
        Self {
            id: parts.id,
            group_set_id: parts.group_set_id,
            tutorial_id: parts.tutorial_id,
            name: parts.name,
            number: parts.number,
            lock: LockState::from_locked(parts.locked),
            capacity_adjustment: parts.capacity_adjustment,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn group_set_id(&self) -> GroupSetId {
        self.group_set_id
    }

    pub fn tutorial_id(&self) -> TutorialId {
        self.tutorial_id
    }

    pub fn name(&self) -> &GroupName {
        &self.name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn capacity_adjustment(&self) -> i32 {
        self.capacity_adjustment
    }

    /// Move to the requested lock state. Requesting the current state is a
    /// successful no-op.
    pub fn set_locked(&mut self, locked: bool) -> LockTransition {
        let target = LockState::from_locked(locked);
        if self.lock == target {
            return LockTransition::Unchanged;
        }
        self.lock = target;
        match target {
            LockState::Locked => LockTransition::Locked,
            LockState::Unlocked => LockTransition::Unlocked,
        }
    }

    pub fn rename(&mut self, name: GroupName) {
        self.name = name;
    }

    /// Move the group to another tutorial of the same unit.
    pub fn change_tutorial(
        &mut self,
        group_set: &GroupSet,
        tutorial: &Tutorial,
    ) -> Result<(), GroupValidationError> {
        ensure_same_unit(group_set, tutorial)?;
        self.tutorial_id = tutorial.id;
        Ok(())
    }

    pub fn set_capacity_adjustment(&mut self, adjustment: i32) {
        self.capacity_adjustment = adjustment;
    }

    /// Member cap for this group, or `None` when the set is uncapped.
    /// Negative results clamp to zero.
    pub fn effective_capacity(&self, group_set: &GroupSet) -> Option<u32> {
        group_set.capacity().map(|capacity| {
            let total = i64::from(capacity.get()) + i64::from(self.capacity_adjustment);
            u32::try_from(total.max(0)).unwrap_or(u32::MAX)
        })
    }

    /// Whether `member_count` members fill the group.
    pub fn is_full(&self, group_set: &GroupSet, member_count: usize) -> bool {
        self.effective_capacity(group_set)
            .is_some_and(|cap| member_count >= cap as usize)
    }
}

fn ensure_same_unit(group_set: &GroupSet, tutorial: &Tutorial) -> Result<(), GroupValidationError> {
    if tutorial.unit_id == group_set.unit_id() {
        Ok(())
    } else {
        Err(GroupValidationError::TutorialOutsideUnit {
            tutorial: tutorial.id,
            unit: group_set.unit_id(),
        })
    }
}

/// A group together with its current member count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub group: Group,
    pub member_count: usize,
}
