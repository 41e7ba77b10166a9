//! Tests for the group set service.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{GroupSetInput, MockGroupSetRepository};
use crate::domain::test_support::Roster;

#[fixture]
fn roster() -> Roster {
    Roster::new()
}

fn service(roster: &Roster, repo: MockGroupSetRepository) -> GroupSetService<
    crate::domain::ports::MockUnitRepository,
    MockGroupSetRepository,
> {
    GroupSetService::new(Arc::new(roster.unit_repository()), Arc::new(repo))
}

fn create_request(roster: &Roster, actor: crate::domain::UserId, name: &str) -> CreateGroupSetRequest {
    CreateGroupSetRequest {
        actor,
        unit_id: roster.unit_id(),
        group_set: GroupSetInput {
            name: name.to_owned(),
            allow_students_to_manage_groups: Some(true),
            ..GroupSetInput::default()
        },
    }
}

fn existing_set(roster: &Roster) -> GroupSet {
    GroupSet::create(
        GroupSetId::random(),
        roster.unit_id(),
        NewGroupSet {
            name: GroupSetName::new("Teams").expect("valid"),
            policy: GroupSetPolicy::default(),
            capacity: None,
        },
    )
}

#[rstest]
#[tokio::test]
async fn convenor_creates_group_set_with_defaults(roster: Roster) {
    let mut repo = MockGroupSetRepository::new();
    repo.expect_insert().times(1).return_once(|_| Ok(()));

    let created = service(&roster, repo)
        .create_group_set(create_request(&roster, roster.convenor, "  Project teams "))
        .await
        .expect("convenor may create");

    assert_eq!(created.unit_id(), roster.unit_id());
    assert_eq!(created.name().as_ref(), "Project teams");
    assert!(created.allows_students_to_manage_groups());
    assert!(!created.allows_students_to_create_groups());
    assert!(!created.keeps_groups_in_same_class());
    assert!(created.capacity().is_none());
}

#[rstest]
#[case::tutor(false)]
#[case::student(true)]
#[tokio::test]
async fn non_convenors_are_forbidden_before_validation(roster: Roster, #[case] student: bool) {
    let mut repo = MockGroupSetRepository::new();
    repo.expect_insert().times(0);
    let actor = if student { roster.student } else { roster.tutor };

    // The blank name would fail validation; authorization must win.
    let err = service(&roster, repo)
        .create_group_set(create_request(&roster, actor, "   "))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn blank_name_is_invalid_for_convenor(roster: Roster) {
    let mut repo = MockGroupSetRepository::new();
    repo.expect_insert().times(0);
    let err = service(&roster, repo)
        .create_group_set(create_request(&roster, roster.convenor, "  "))
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn duplicate_name_is_a_conflict(roster: Roster) {
    let mut repo = MockGroupSetRepository::new();
    repo.expect_insert()
        .return_once(|set| Err(GroupSetRepositoryError::duplicate_name(set.name().as_ref())));
    let err = service(&roster, repo)
        .create_group_set(create_request(&roster, roster.convenor, "Teams"))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn unknown_unit_is_not_found(roster: Roster) {
    let repo = MockGroupSetRepository::new();
    let mut request = create_request(&roster, roster.convenor, "Teams");
    request.unit_id = UnitId::random();
    let err = service(&roster, repo)
        .create_group_set(request)
        .await
        .expect_err("missing unit");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_applies_changes_and_persists(roster: Roster) {
    let set = existing_set(&roster);
    let set_id = set.id();
    let mut repo = MockGroupSetRepository::new();
    repo.expect_find().return_once(move |_| Ok(Some(set)));
    repo.expect_update().times(1).return_once(|_| Ok(()));

    let updated = service(&roster, repo)
        .update_group_set(UpdateGroupSetRequest {
            actor: roster.convenor,
            unit_id: roster.unit_id(),
            group_set_id: set_id,
            changes: GroupSetUpdate {
                keep_groups_in_same_class: Some(true),
                capacity: Some(Some(5)),
                ..GroupSetUpdate::default()
            },
        })
        .await
        .expect("update succeeds");
    assert!(updated.keeps_groups_in_same_class());
    assert_eq!(updated.capacity().map(GroupCapacity::get), Some(5));
    assert_eq!(updated.name().as_ref(), "Teams");
}

#[rstest]
#[tokio::test]
async fn update_of_set_in_another_unit_is_not_found(roster: Roster) {
    let foreign = GroupSet::create(
        GroupSetId::random(),
        UnitId::random(),
        NewGroupSet {
            name: GroupSetName::new("Elsewhere").expect("valid"),
            policy: GroupSetPolicy::default(),
            capacity: None,
        },
    );
    let foreign_id = foreign.id();
    let mut repo = MockGroupSetRepository::new();
    repo.expect_find().return_once(move |_| Ok(Some(foreign)));
    repo.expect_update().times(0);

    let err = service(&roster, repo)
        .update_group_set(UpdateGroupSetRequest {
            actor: roster.convenor,
            unit_id: roster.unit_id(),
            group_set_id: foreign_id,
            changes: GroupSetUpdate::default(),
        })
        .await
        .expect_err("not in unit");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn delete_requires_convenor(roster: Roster) {
    let mut repo = MockGroupSetRepository::new();
    repo.expect_delete().times(0);
    let err = service(&roster, repo)
        .delete_group_set(DeleteGroupSetRequest {
            actor: roster.tutor,
            unit_id: roster.unit_id(),
            group_set_id: GroupSetId::random(),
        })
        .await
        .expect_err("tutor cannot delete");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn convenor_deletes_group_set(roster: Roster) {
    let set = existing_set(&roster);
    let set_id = set.id();
    let mut repo = MockGroupSetRepository::new();
    repo.expect_find().return_once(move |_| Ok(Some(set)));
    repo.expect_delete().times(1).return_once(|_| Ok(true));

    service(&roster, repo)
        .delete_group_set(DeleteGroupSetRequest {
            actor: roster.convenor,
            unit_id: roster.unit_id(),
            group_set_id: set_id,
        })
        .await
        .expect("delete succeeds");
}

#[rstest]
#[tokio::test]
async fn students_may_list_group_sets(roster: Roster) {
    let set = existing_set(&roster);
    let mut repo = MockGroupSetRepository::new();
    repo.expect_list_for_unit().return_once(move |_| Ok(vec![set]));
    let listed = service(&roster, repo)
        .list_group_sets(ListGroupSetsRequest {
            actor: roster.student,
            unit_id: roster.unit_id(),
        })
        .await
        .expect("students see group sets");
    assert_eq!(listed.len(), 1);
}

#[rstest]
#[tokio::test]
async fn connection_errors_map_to_service_unavailable(roster: Roster) {
    let mut repo = MockGroupSetRepository::new();
    repo.expect_list_for_unit()
        .return_once(|_| Err(GroupSetRepositoryError::connection("pool exhausted")));
    let err = service(&roster, repo)
        .list_group_sets(ListGroupSetsRequest {
            actor: roster.convenor,
            unit_id: roster.unit_id(),
        })
        .await
        .expect_err("unavailable");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
