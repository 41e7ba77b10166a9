//! PostgreSQL-backed roster seeding adapter.
//!
//! Applies accounts, units, staff, tutorials and projects within one
//! transaction. A roster whose units all exist already is skipped.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    RosterSeed, RosterSeedRepository, RosterSeedRepositoryError, SeedingResult,
};

use super::diesel_basic_error_mapping::map_basic_pool_error;
use super::models::{NewUserRow, ProjectRow, TutorialRow, UnitRow, UnitStaffRow};
use super::pool::{DbPool, PoolError};
use super::schema::{projects, tutorials, unit_staff, units, users};

/// Diesel-backed implementation of the roster seeding port.
#[derive(Clone)]
pub struct DieselRosterSeedRepository {
    pool: DbPool,
}

impl DieselRosterSeedRepository {
    /// Create a new seeding repository with the given connection pool.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use groups_backend::outbound::persistence::{
    ///     DbPool, DieselRosterSeedRepository, PoolConfig,
    /// };
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost")).await?;
    /// let repository = DieselRosterSeedRepository::new(pool);
    /// # let _ = repository;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RosterSeedRepositoryError {
    map_basic_pool_error(error, RosterSeedRepositoryError::connection)
}

/// Seeding errors keep the database message; they only reach operator logs.
fn map_diesel_error(error: diesel::result::Error) -> RosterSeedRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            RosterSeedRepositoryError::connection(info.message().to_owned())
        }
        DieselError::DatabaseError(_, info) => {
            RosterSeedRepositoryError::query(info.message().to_owned())
        }
        other => RosterSeedRepositoryError::query(other.to_string()),
    }
}

#[async_trait]
impl RosterSeedRepository for DieselRosterSeedRepository {
    async fn seed_roster(
        &self,
        seed: RosterSeed,
    ) -> Result<SeedingResult, RosterSeedRepositoryError> {
        let user_rows: Vec<NewUserRow<'_>> = seed.accounts.iter().map(NewUserRow::from).collect();
        let unit_rows: Vec<UnitRow> = seed.units.iter().map(UnitRow::from_domain).collect();
        let staff_rows: Vec<UnitStaffRow> = seed
            .units
            .iter()
            .flat_map(UnitStaffRow::for_unit)
            .collect();
        let tutorial_rows: Vec<TutorialRow> = seed.tutorials.iter().map(TutorialRow::from).collect();
        let project_rows: Vec<ProjectRow> = seed.projects.iter().map(ProjectRow::from).collect();
        let unit_ids: Vec<Uuid> = unit_rows.iter().map(|row| row.id).collect();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let existing: i64 = units::table
                    .filter(units::id.eq_any(&unit_ids))
                    .count()
                    .get_result(conn)
                    .await?;
                if !unit_ids.is_empty() && usize::try_from(existing) == Ok(unit_ids.len()) {
                    return Ok(SeedingResult::AlreadySeeded);
                }

                if !user_rows.is_empty() {
                    diesel::insert_into(users::table)
                        .values(&user_rows)
                        .on_conflict(users::id)
                        .do_update()
                        .set((
                            users::display_name.eq(excluded(users::display_name)),
                            users::password_digest.eq(excluded(users::password_digest)),
                        ))
                        .execute(conn)
                        .await?;
                }
                if !unit_rows.is_empty() {
                    diesel::insert_into(units::table)
                        .values(&unit_rows)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }
                if !staff_rows.is_empty() {
                    diesel::insert_into(unit_staff::table)
                        .values(&staff_rows)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }
                if !tutorial_rows.is_empty() {
                    diesel::insert_into(tutorials::table)
                        .values(&tutorial_rows)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }
                if !project_rows.is_empty() {
                    diesel::insert_into(projects::table)
                        .values(&project_rows)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }

                Ok(SeedingResult::Applied)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
