//! Demo roster used for local development and end-to-end tests.
//!
//! Identifiers are fixed so that repeated seeding is idempotent and tests can
//! address the seeded unit directly.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    RosterSeed, RosterSeedRepository, RosterSeedRepositoryError, SeedingResult, UserAccount,
};
use crate::domain::{
    DisplayName, PasswordDigest, Project, ProjectId, StaffAssignment, StaffRole, Tutorial,
    TutorialId, Unit, UnitDraft, UnitId, UnitValidationError, User, UserId, UserValidationError,
    Username,
};

/// Seeded demo unit.
pub const DEMO_UNIT_ID: UnitId =
    UnitId::from_uuid(Uuid::from_u128(0x0d3a_0000_0000_4000_8000_0000_0000_0001));
/// Tutorial the demo students attend.
pub const DEMO_TUTORIAL_ID: TutorialId =
    TutorialId::from_uuid(Uuid::from_u128(0x0d3a_0000_0000_4000_8000_0000_0000_0101));
/// Second tutorial of the demo unit.
pub const DEMO_OTHER_TUTORIAL_ID: TutorialId =
    TutorialId::from_uuid(Uuid::from_u128(0x0d3a_0000_0000_4000_8000_0000_0000_0102));

/// Login handles of the demo accounts, with their unit relationship.
pub const DEMO_CONVENOR: &str = "convenor";
pub const DEMO_TUTOR: &str = "tutor";
pub const DEMO_STUDENTS: [&str; 3] = ["student1", "student2", "student3"];

/// Errors raised while building or applying the demo roster.
#[derive(Debug, Error)]
pub enum DemoRosterError {
    #[error("demo account failed validation: {0}")]
    Account(#[from] UserValidationError),
    #[error("demo unit failed validation: {0}")]
    Unit(#[from] UnitValidationError),
    #[error("demo roster persistence error: {0}")]
    Persistence(#[from] RosterSeedRepositoryError),
}

fn demo_uuid(offset: u128) -> Uuid {
    Uuid::from_u128(0x0d3a_0000_0000_4000_8000_0000_0001_0000 + offset)
}

fn account(
    index: u128,
    username: &str,
    display: &str,
    password: &str,
) -> Result<UserAccount, DemoRosterError> {
    let username = Username::new(username)?;
    let password_digest = PasswordDigest::derive(&username, password);
    let display_name = DisplayName::new(display)?;
    Ok(UserAccount {
        user: User::new(demo_user_id(index), username, display_name),
        password_digest,
    })
}

/// Stable id of a demo account by position: convenor, tutor, then students.
pub fn demo_user_id(index: u128) -> UserId {
    UserId::from_uuid(demo_uuid(index))
}

/// Stable project id of the `n`th demo student (zero based).
pub fn demo_project_id(student: u128) -> ProjectId {
    ProjectId::from_uuid(demo_uuid(0x100 + student))
}

/// Build the demo roster. Every account shares `password`.
pub fn demo_roster(password: &str) -> Result<RosterSeed, DemoRosterError> {
    let mut accounts = vec![
        account(0, DEMO_CONVENOR, "Demo Convenor", password)?,
        account(1, DEMO_TUTOR, "Demo Tutor", password)?,
    ];
    for (offset, name) in (2u128..).zip(DEMO_STUDENTS) {
        accounts.push(account(offset, name, &format!("Demo {name}"), password)?);
    }

    let unit = Unit::new(UnitDraft {
        id: DEMO_UNIT_ID,
        code: "DEMO101".to_owned(),
        name: "Demonstration unit".to_owned(),
        main_convenor: demo_user_id(0),
        staff: vec![StaffAssignment {
            user_id: demo_user_id(1),
            role: StaffRole::Tutor,
        }],
    })?;
    let tutorials = vec![
        Tutorial {
            id: DEMO_TUTORIAL_ID,
            unit_id: DEMO_UNIT_ID,
            abbreviation: "LA1-01".to_owned(),
            tutor: Some(demo_user_id(1)),
        },
        Tutorial {
            id: DEMO_OTHER_TUTORIAL_ID,
            unit_id: DEMO_UNIT_ID,
            abbreviation: "LA1-02".to_owned(),
            tutor: Some(demo_user_id(1)),
        },
    ];
    let projects = (0u128..)
        .zip(DEMO_STUDENTS)
        .map(|(index, _)| Project {
            id: demo_project_id(index),
            unit_id: DEMO_UNIT_ID,
            student: demo_user_id(index + 2),
            tutorial_id: Some(if index == 2 {
                DEMO_OTHER_TUTORIAL_ID
            } else {
                DEMO_TUTORIAL_ID
            }),
            enrolled: true,
        })
        .collect();

    Ok(RosterSeed {
        accounts,
        units: vec![unit],
        tutorials,
        projects,
    })
}

/// Applies the demo roster through a [`RosterSeedRepository`].
#[derive(Clone)]
pub struct DemoRosterSeeder<R> {
    repository: Arc<R>,
}

impl<R> DemoRosterSeeder<R>
where
    R: RosterSeedRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Seed the demo unit. Safe to call on every start.
    pub async fn seed(&self, password: &str) -> Result<SeedingResult, DemoRosterError> {
        let roster = demo_roster(password)?;
        let result = self.repository.seed_roster(roster).await?;
        info!(unit_id = %DEMO_UNIT_ID, ?result, "demo roster seeding finished");
        Ok(result)
    }
}
