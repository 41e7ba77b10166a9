//! Port for reading units, their tutorials and student enrollments.

use async_trait::async_trait;

use crate::domain::{Project, ProjectId, Tutorial, TutorialId, Unit, UnitId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by unit repository adapters.
    pub enum UnitRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "unit repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "unit repository query failed: {message}",
    }
}

/// Read access to unit rosters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Find a unit together with its staff assignments.
    async fn find_unit(&self, unit_id: &UnitId) -> Result<Option<Unit>, UnitRepositoryError>;

    async fn find_tutorial(
        &self,
        tutorial_id: &TutorialId,
    ) -> Result<Option<Tutorial>, UnitRepositoryError>;

    async fn find_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<Project>, UnitRepositoryError>;

    /// Find the enrollment of `student` in `unit_id`, enrolled or not.
    async fn find_project_for_student(
        &self,
        unit_id: &UnitId,
        student: &UserId,
    ) -> Result<Option<Project>, UnitRepositoryError>;
}
