//! Rules for placing a project into a group.

use super::error::Error;
use super::group::Group;
use super::group_set::GroupSet;
use super::ids::GroupId;
use super::unit::Project;

/// Reasons a project cannot join a group.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("project is not enrolled in this unit")]
    NotEnrolled,
    #[error("project is already a member of group {group} in this group set")]
    AlreadyInGroupSet { group: GroupId },
    #[error("project attends a different tutorial from the group")]
    TutorialMismatch,
    #[error("group is full (capacity {capacity})")]
    GroupFull { capacity: u32 },
}

impl From<MembershipError> for Error {
    fn from(value: MembershipError) -> Self {
        let message = value.to_string();
        match value {
            MembershipError::NotEnrolled | MembershipError::TutorialMismatch => {
                Self::invalid_request(message)
            }
            MembershipError::AlreadyInGroupSet { .. } | MembershipError::GroupFull { .. } => {
                Self::conflict(message)
            }
        }
    }
}

/// Facts about a prospective membership gathered by the caller.
#[derive(Debug, Clone, Copy)]
pub struct JoinCandidate<'a> {
    pub group_set: &'a GroupSet,
    pub group: &'a Group,
    pub project: &'a Project,
    /// Group in the same set that already holds the project, if any.
    pub current_group: Option<GroupId>,
    pub member_count: usize,
    /// Staff may place students into full groups.
    pub by_staff: bool,
}

/// Check whether the candidate project may join the group.
///
/// Order matters: enrollment first, then the one-group-per-set rule, the
/// tutorial rule, and capacity last.
pub fn check_join(candidate: JoinCandidate<'_>) -> Result<(), MembershipError> {
    let JoinCandidate {
        group_set,
        group,
        project,
        current_group,
        member_count,
        by_staff,
    } = candidate;

    if !project.is_active_in(group_set.unit_id()) {
        return Err(MembershipError::NotEnrolled);
    }
    if let Some(existing) = current_group {
        return Err(MembershipError::AlreadyInGroupSet { group: existing });
    }
    if group_set.keeps_groups_in_same_class() && project.tutorial_id != Some(group.tutorial_id()) {
        return Err(MembershipError::TutorialMismatch);
    }
    if !by_staff && group.is_full(group_set, member_count) {
        let capacity = group.effective_capacity(group_set).unwrap_or_default();
        return Err(MembershipError::GroupFull { capacity });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for membership rules.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::group::{GroupDraft, GroupName, NewGroup};
    use crate::domain::group_set::{GroupCapacity, GroupSetName, GroupSetPolicy, NewGroupSet};
    use crate::domain::ids::{GroupSetId, ProjectId, TutorialId, UnitId, UserId};
    use crate::domain::unit::Tutorial;
    use rstest::{fixture, rstest};

    struct Setup {
        set: GroupSet,
        group: Group,
        project: Project,
    }

    fn setup(policy: GroupSetPolicy, capacity: Option<u32>) -> Setup {
        let unit_id = UnitId::random();
        let set = GroupSet::create(
            GroupSetId::random(),
            unit_id,
            NewGroupSet {
                name: GroupSetName::new("Teams").expect("valid"),
                policy,
                capacity: capacity.map(|c| GroupCapacity::new(c).expect("valid")),
            },
        );
        let tutorial = Tutorial {
            id: TutorialId::random(),
            unit_id,
            abbreviation: "LA1-01".to_owned(),
            tutor: None,
        };
        let group = GroupDraft::new(
            GroupId::random(),
            &set,
            &tutorial,
            NewGroup {
                name: GroupName::new("Alpha").expect("valid"),
                tutorial_id: tutorial.id,
                capacity_adjustment: 0,
            },
        )
        .and_then(|draft| draft.into_group(1))
        .expect("valid group");
        let project = Project {
            id: ProjectId::random(),
            unit_id,
            student: UserId::random(),
            tutorial_id: Some(tutorial.id),
            enrolled: true,
        };
        Setup {
            set,
            group,
            project,
        }
    }

    #[fixture]
    fn open_setup() -> Setup {
        setup(GroupSetPolicy::default(), None)
    }

    fn candidate(setup: &Setup) -> JoinCandidate<'_> {
        JoinCandidate {
            group_set: &setup.set,
            group: &setup.group,
            project: &setup.project,
            current_group: None,
            member_count: 0,
            by_staff: false,
        }
    }

    #[rstest]
    fn enrolled_project_joins_open_group(open_setup: Setup) {
        assert_eq!(check_join(candidate(&open_setup)), Ok(()));
    }

    #[rstest]
    fn withdrawn_project_is_rejected(mut open_setup: Setup) {
        open_setup.project.enrolled = false;
        let err = check_join(candidate(&open_setup)).expect_err("withdrawn");
        assert_eq!(err, MembershipError::NotEnrolled);
        assert_eq!(Error::from(err).code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn second_group_in_set_is_a_conflict(open_setup: Setup) {
        let existing = GroupId::random();
        let err = check_join(JoinCandidate {
            current_group: Some(existing),
            ..candidate(&open_setup)
        })
        .expect_err("already grouped");
        assert_eq!(err, MembershipError::AlreadyInGroupSet { group: existing });
        assert_eq!(Error::from(err).code(), ErrorCode::Conflict);
    }

    #[rstest]
    fn same_class_policy_requires_matching_tutorial() {
        let mut s = setup(
            GroupSetPolicy {
                keep_groups_in_same_class: true,
                ..GroupSetPolicy::default()
            },
            None,
        );
        s.project.tutorial_id = Some(TutorialId::random());
        assert_eq!(
            check_join(candidate(&s)),
            Err(MembershipError::TutorialMismatch)
        );
    }

    #[rstest]
    #[case(false, Err(MembershipError::GroupFull { capacity: 2 }))]
    #[case(true, Ok(()))]
    fn full_groups_only_admit_staff_placements(
        #[case] by_staff: bool,
        #[case] expected: Result<(), MembershipError>,
    ) {
        let s = setup(GroupSetPolicy::default(), Some(2));
        let outcome = check_join(JoinCandidate {
            member_count: 2,
            by_staff,
            ..candidate(&s)
        });
        assert_eq!(outcome, expected);
    }
}
