//! Shared lookup steps for services that act within a unit.

use super::authorization::{Actor, GroupAction, authorize};
use super::error::Error;
use super::ids::{UnitId, UserId};
use super::ports::{UnitRepository, UnitRepositoryError};

pub(crate) fn map_unit_repository_error(error: UnitRepositoryError) -> Error {
    match error {
        UnitRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("unit repository unavailable: {message}"))
        }
        UnitRepositoryError::Query { message } => {
            Error::internal(format!("unit repository error: {message}"))
        }
    }
}

/// Load the unit and derive the caller's role on it.
///
/// Outsiders are refused here, before any child resource is looked up, so
/// they cannot discover which group sets or groups exist.
pub(crate) async fn resolve_actor<U>(
    units: &U,
    user_id: UserId,
    unit_id: UnitId,
    action: GroupAction,
) -> Result<Actor, Error>
where
    U: UnitRepository + ?Sized,
{
    let unit = units
        .find_unit(&unit_id)
        .await
        .map_err(map_unit_repository_error)?
        .ok_or_else(|| Error::not_found(format!("unit {unit_id} not found")))?;
    let project = if unit.staff_role_of(user_id).is_some() {
        None
    } else {
        units
            .find_project_for_student(&unit_id, &user_id)
            .await
            .map_err(map_unit_repository_error)?
    };
    let actor = Actor::resolve(user_id, &unit, project);
    authorize(
        actor.is_staff() || actor.is_student(),
        &actor,
        action,
    )?;
    Ok(actor)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for actor resolution.
    use super::*;
    use crate::domain::ports::MockUnitRepository;
    use crate::domain::{ErrorCode, Project, ProjectId, Unit, UnitDraft, UnitRole};
    use rstest::rstest;

    fn unit(convenor: UserId) -> Unit {
        Unit::new(UnitDraft {
            id: UnitId::random(),
            code: "FIT3077".to_owned(),
            name: "Software architecture".to_owned(),
            main_convenor: convenor,
            staff: Vec::new(),
        })
        .expect("valid unit")
    }

    #[rstest]
    #[tokio::test]
    async fn missing_unit_is_not_found() {
        let mut units = MockUnitRepository::new();
        units.expect_find_unit().return_once(|_| Ok(None));
        let err = resolve_actor(&units, UserId::random(), UnitId::random(), GroupAction::ListGroups)
            .await
            .expect_err("missing unit");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn staff_skip_the_enrollment_lookup() {
        let convenor = UserId::random();
        let found = unit(convenor);
        let unit_id = found.id();
        let mut units = MockUnitRepository::new();
        units.expect_find_unit().return_once(move |_| Ok(Some(found)));
        units.expect_find_project_for_student().times(0);

        let actor = resolve_actor(&units, convenor, unit_id, GroupAction::ListGroups)
            .await
            .expect("convenor resolves");
        assert_eq!(actor.role(), UnitRole::Convenor);
    }

    #[rstest]
    #[tokio::test]
    async fn enrolled_student_resolves() {
        let student = UserId::random();
        let found = unit(UserId::random());
        let unit_id = found.id();
        let project = Project {
            id: ProjectId::random(),
            unit_id,
            student,
            tutorial_id: None,
            enrolled: true,
        };
        let mut units = MockUnitRepository::new();
        units.expect_find_unit().return_once(move |_| Ok(Some(found)));
        units
            .expect_find_project_for_student()
            .return_once(move |_, _| Ok(Some(project)));

        let actor = resolve_actor(&units, student, unit_id, GroupAction::ViewGroupSets)
            .await
            .expect("student resolves");
        assert_eq!(actor.role(), UnitRole::Student);
    }

    #[rstest]
    #[tokio::test]
    async fn outsiders_are_forbidden() {
        let found = unit(UserId::random());
        let unit_id = found.id();
        let mut units = MockUnitRepository::new();
        units.expect_find_unit().return_once(move |_| Ok(Some(found)));
        units
            .expect_find_project_for_student()
            .return_once(|_, _| Ok(None));

        let err = resolve_actor(&units, UserId::random(), unit_id, GroupAction::CreateGroup)
            .await
            .expect_err("outsider");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn connection_failures_are_unavailable() {
        let mut units = MockUnitRepository::new();
        units
            .expect_find_unit()
            .return_once(|_| Err(UnitRepositoryError::connection("refused")));
        let err = resolve_actor(&units, UserId::random(), UnitId::random(), GroupAction::ListGroups)
            .await
            .expect_err("connection failure");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
