//! Units, their tutorials, and student enrollments (projects).
//!
//! These are read models for this service: units are seeded or synchronised
//! from elsewhere and never mutated through the group endpoints.

use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, TutorialId, UnitId, UserId};

/// Staff roles that can be assigned on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Full management rights over the unit.
    Convenor,
    /// Runs tutorials and manages groups.
    Tutor,
}

impl StaffRole {
    /// Stable lowercase name used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Convenor => "convenor",
            Self::Tutor => "tutor",
        }
    }
}

impl std::str::FromStr for StaffRole {
    type Err = UnitValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "convenor" => Ok(Self::Convenor),
            "tutor" => Ok(Self::Tutor),
            other => Err(UnitValidationError::UnknownStaffRole(other.to_owned())),
        }
    }
}

/// A user's staff role on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAssignment {
    pub user_id: UserId,
    pub role: StaffRole,
}

/// Validation failures raised while building unit read models.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitValidationError {
    #[error("unit code must not be empty")]
    EmptyCode,
    #[error("unit name must not be empty")]
    EmptyName,
    #[error("unknown staff role: {0}")]
    UnknownStaffRole(String),
}

/// Input for [`Unit::new`].
#[derive(Debug, Clone)]
pub struct UnitDraft {
    pub id: UnitId,
    pub code: String,
    pub name: String,
    pub main_convenor: UserId,
    pub staff: Vec<StaffAssignment>,
}

/// A teaching unit.
///
/// ## Invariants
/// - `code` and `name` are trimmed and non-empty.
/// - The main convenor is always treated as a convenor, whether or not the
///   staff list repeats them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    code: String,
    name: String,
    main_convenor: UserId,
    staff: Vec<StaffAssignment>,
}

impl Unit {
    /// Validate and build a unit.
    pub fn new(draft: UnitDraft) -> Result<Self, UnitValidationError> {
        let code = draft.code.trim();
        if code.is_empty() {
            return Err(UnitValidationError::EmptyCode);
        }
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(UnitValidationError::EmptyName);
        }
        Ok(Self {
            id: draft.id,
            code: code.to_owned(),
            name: name.to_owned(),
            main_convenor: draft.main_convenor,
            staff: draft.staff,
        })
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The user accountable for the unit.
    pub fn main_convenor(&self) -> UserId {
        self.main_convenor
    }

    pub fn staff(&self) -> &[StaffAssignment] {
        &self.staff
    }

    /// Staff role held by `user`, if any. Convenor outranks tutor when a
    /// user appears twice.
    pub fn staff_role_of(&self, user: UserId) -> Option<StaffRole> {
        if user == self.main_convenor {
            return Some(StaffRole::Convenor);
        }
        self.staff
            .iter()
            .filter(|assignment| assignment.user_id == user)
            .map(|assignment| assignment.role)
            .min_by_key(|role| match role {
                StaffRole::Convenor => 0,
                StaffRole::Tutor => 1,
            })
    }
}

/// A class within a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutorial {
    pub id: TutorialId,
    pub unit_id: UnitId,
    pub abbreviation: String,
    pub tutor: Option<UserId>,
}

/// A student's enrollment in a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub unit_id: UnitId,
    pub student: UserId,
    pub tutorial_id: Option<TutorialId>,
    pub enrolled: bool,
}

impl Project {
    /// Whether this project counts as an active student of `unit`.
    pub fn is_active_in(&self, unit: UnitId) -> bool {
        self.enrolled && self.unit_id == unit
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn convenor() -> UserId {
        UserId::random()
    }

    fn unit_with_staff(main: UserId, staff: Vec<StaffAssignment>) -> Unit {
        Unit::new(UnitDraft {
            id: UnitId::random(),
            code: " FIT2101 ".to_owned(),
            name: "Software engineering".to_owned(),
            main_convenor: main,
            staff,
        })
        .expect("valid unit")
    }

    #[rstest]
    fn trims_code(convenor: UserId) {
        let unit = unit_with_staff(convenor, Vec::new());
        assert_eq!(unit.code(), "FIT2101");
    }

    #[rstest]
    fn rejects_blank_name(convenor: UserId) {
        let err = Unit::new(UnitDraft {
            id: UnitId::random(),
            code: "FIT".to_owned(),
            name: "  ".to_owned(),
            main_convenor: convenor,
            staff: Vec::new(),
        })
        .expect_err("blank name");
        assert_eq!(err, UnitValidationError::EmptyName);
    }

    #[rstest]
    fn main_convenor_is_convenor_without_assignment(convenor: UserId) {
        let unit = unit_with_staff(convenor, Vec::new());
        assert_eq!(unit.staff_role_of(convenor), Some(StaffRole::Convenor));
        assert_eq!(unit.staff_role_of(UserId::random()), None);
    }

    #[rstest]
    fn convenor_assignment_outranks_tutor(convenor: UserId) {
        let both = UserId::random();
        let unit = unit_with_staff(
            convenor,
            vec![
                StaffAssignment {
                    user_id: both,
                    role: StaffRole::Tutor,
                },
                StaffAssignment {
                    user_id: both,
                    role: StaffRole::Convenor,
                },
            ],
        );
        assert_eq!(unit.staff_role_of(both), Some(StaffRole::Convenor));
    }

    #[rstest]
    #[case("convenor", Some(StaffRole::Convenor))]
    #[case("tutor", Some(StaffRole::Tutor))]
    #[case("admin", None)]
    fn staff_role_parses(#[case] raw: &str, #[case] expected: Option<StaffRole>) {
        assert_eq!(raw.parse::<StaffRole>().ok(), expected);
    }
}
