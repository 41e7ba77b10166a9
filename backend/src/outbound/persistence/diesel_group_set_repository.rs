//! PostgreSQL-backed group set storage.
//!
//! Name uniqueness is enforced by the `group_sets_unit_name_key` constraint
//! on the lowercased `name_key` column. Deleting a set cascades to its
//! groups and memberships through foreign keys.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{GroupSetRepository, GroupSetRepositoryError};
use crate::domain::{GroupSet, GroupSetId, UnitId};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, violated_unique_constraint,
};
use super::models::{GroupSetRow, GroupSetUpdateRow, NewGroupSetRow};
use super::pool::{DbPool, PoolError};
use super::schema::group_sets;

const NAME_CONSTRAINT: &str = "group_sets_unit_name_key";

/// Diesel-backed implementation of [`GroupSetRepository`].
#[derive(Clone)]
pub struct DieselGroupSetRepository {
    pool: DbPool,
}

impl DieselGroupSetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> GroupSetRepositoryError {
    map_basic_pool_error(error, GroupSetRepositoryError::connection)
}

/// Map Diesel errors, reporting a name clash for `group_set`.
fn map_write_error(error: diesel::result::Error, group_set: &GroupSet) -> GroupSetRepositoryError {
    if violated_unique_constraint(&error) == Some(NAME_CONSTRAINT) {
        return GroupSetRepositoryError::duplicate_name(group_set.name().as_ref());
    }
    map_diesel_error(error)
}

fn map_diesel_error(error: diesel::result::Error) -> GroupSetRepositoryError {
    map_basic_diesel_error(
        error,
        GroupSetRepositoryError::query,
        GroupSetRepositoryError::connection,
    )
}

#[async_trait]
impl GroupSetRepository for DieselGroupSetRepository {
    async fn list_for_unit(
        &self,
        unit_id: &UnitId,
    ) -> Result<Vec<GroupSet>, GroupSetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<GroupSetRow> = group_sets::table
            .filter(group_sets::unit_id.eq(unit_id.as_uuid()))
            .select(GroupSetRow::as_select())
            .order_by(group_sets::name_key.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(GroupSetRow::into_domain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(GroupSetRepositoryError::query)
    }

    async fn find(&self, id: &GroupSetId) -> Result<Option<GroupSet>, GroupSetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<GroupSetRow> = group_sets::table
            .find(id.as_uuid())
            .select(GroupSetRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(GroupSetRow::into_domain)
            .transpose()
            .map_err(GroupSetRepositoryError::query)
    }

    async fn insert(&self, group_set: &GroupSet) -> Result<(), GroupSetRepositoryError> {
        let row = NewGroupSetRow::from_domain(group_set).map_err(GroupSetRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(group_sets::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, group_set))
    }

    async fn update(&self, group_set: &GroupSet) -> Result<(), GroupSetRepositoryError> {
        let changes =
            GroupSetUpdateRow::from_domain(group_set).map_err(GroupSetRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(group_sets::table.find(group_set.id().as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(|err| map_write_error(err, group_set))?;
        if updated == 0 {
            return Err(GroupSetRepositoryError::query(format!(
                "group set {} does not exist",
                group_set.id()
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: &GroupSetId) -> Result<bool, GroupSetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(group_sets::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
