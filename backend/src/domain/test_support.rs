//! Shared fixtures for domain service tests.

use crate::domain::ports::MockUnitRepository;
use crate::domain::{
    Project, ProjectId, StaffAssignment, StaffRole, Tutorial, TutorialId, Unit, UnitDraft, UnitId,
    UserId,
};

/// A unit with one of each kind of member.
#[derive(Debug, Clone)]
pub(crate) struct Roster {
    pub unit: Unit,
    pub convenor: UserId,
    pub tutor: UserId,
    pub student: UserId,
    pub project: Project,
    pub tutorial: Tutorial,
    pub other_tutorial: Tutorial,
}

impl Roster {
    pub fn new() -> Self {
        let convenor = UserId::random();
        let tutor = UserId::random();
        let student = UserId::random();
        let unit_id = UnitId::random();
        let unit = Unit::new(UnitDraft {
            id: unit_id,
            code: "FIT2101".to_owned(),
            name: "Software engineering process".to_owned(),
            main_convenor: convenor,
            staff: vec![StaffAssignment {
                user_id: tutor,
                role: StaffRole::Tutor,
            }],
        })
        .expect("valid unit");
        let tutorial = Tutorial {
            id: TutorialId::random(),
            unit_id,
            abbreviation: "LA1-01".to_owned(),
            tutor: Some(tutor),
        };
        let other_tutorial = Tutorial {
            id: TutorialId::random(),
            unit_id,
            abbreviation: "LA1-02".to_owned(),
            tutor: Some(tutor),
        };
        let project = Project {
            id: ProjectId::random(),
            unit_id,
            student,
            tutorial_id: Some(tutorial.id),
            enrolled: true,
        };
        Self {
            unit,
            convenor,
            tutor,
            student,
            project,
            tutorial,
            other_tutorial,
        }
    }

    pub fn unit_id(&self) -> UnitId {
        self.unit.id()
    }

    /// Unit repository double answering from this roster.
    pub fn unit_repository(&self) -> MockUnitRepository {
        let mut units = MockUnitRepository::new();
        let unit = self.unit.clone();
        units
            .expect_find_unit()
            .returning(move |id| Ok((*id == unit.id()).then(|| unit.clone())));
        let project = self.project.clone();
        units
            .expect_find_project_for_student()
            .returning(move |unit_id, student| {
                Ok((project.unit_id == *unit_id && project.student == *student)
                    .then(|| project.clone()))
            });
        let project = self.project.clone();
        units
            .expect_find_project()
            .returning(move |id| Ok((*id == project.id).then(|| project.clone())));
        let tutorials = [self.tutorial.clone(), self.other_tutorial.clone()];
        units.expect_find_tutorial().returning(move |id| {
            Ok(tutorials.iter().find(|t| t.id == *id).cloned())
        });
        units
    }
}
