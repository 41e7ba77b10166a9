//! PostgreSQL-backed reads of units, tutorials and enrollments.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UnitRepository, UnitRepositoryError};
use crate::domain::{Project, ProjectId, Tutorial, TutorialId, Unit, UnitId, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{ProjectRow, TutorialRow, UnitRow, UnitStaffRow};
use super::pool::{DbPool, PoolError};
use super::schema::{projects, tutorials, unit_staff, units};

/// Diesel-backed implementation of [`UnitRepository`].
#[derive(Clone)]
pub struct DieselUnitRepository {
    pool: DbPool,
}

impl DieselUnitRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UnitRepositoryError {
    map_basic_pool_error(error, UnitRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UnitRepositoryError {
    map_basic_diesel_error(
        error,
        UnitRepositoryError::query,
        UnitRepositoryError::connection,
    )
}

#[async_trait]
impl UnitRepository for DieselUnitRepository {
    async fn find_unit(&self, unit_id: &UnitId) -> Result<Option<Unit>, UnitRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(row) = units::table
            .find(unit_id.as_uuid())
            .select(UnitRow::as_select())
            .first::<UnitRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };
        let staff: Vec<UnitStaffRow> = unit_staff::table
            .filter(unit_staff::unit_id.eq(unit_id.as_uuid()))
            .select(UnitStaffRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row.into_domain(staff)
            .map(Some)
            .map_err(UnitRepositoryError::query)
    }

    async fn find_tutorial(
        &self,
        tutorial_id: &TutorialId,
    ) -> Result<Option<Tutorial>, UnitRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TutorialRow> = tutorials::table
            .find(tutorial_id.as_uuid())
            .select(TutorialRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Tutorial::from))
    }

    async fn find_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<Project>, UnitRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProjectRow> = projects::table
            .find(project_id.as_uuid())
            .select(ProjectRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Project::from))
    }

    async fn find_project_for_student(
        &self,
        unit_id: &UnitId,
        student: &UserId,
    ) -> Result<Option<Project>, UnitRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProjectRow> = projects::table
            .filter(projects::unit_id.eq(unit_id.as_uuid()))
            .filter(projects::student_id.eq(student.as_uuid()))
            .select(ProjectRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Project::from))
    }
}
