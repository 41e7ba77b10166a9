//! PostgreSQL-backed group and membership storage.
//!
//! Group creation locks the parent group set row so concurrent creates in
//! the same set receive distinct sequential numbers. Membership rows are
//! keyed by (group set, project), which makes "one group per set" a primary
//! key violation rather than an application check.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{GroupRepository, GroupRepositoryError};
use crate::domain::{Group, GroupDraft, GroupId, GroupSetId, GroupSummary, ProjectId, UnitId};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, violated_unique_constraint,
};
use super::models::{GroupRow, GroupUpdateRow, NewGroupRow, NewMembershipRow};
use super::pool::{DbPool, PoolError};
use super::schema::{group_memberships, group_sets, groups};

const NAME_CONSTRAINT: &str = "groups_set_name_key";
const MEMBERSHIP_KEY: &str = "group_memberships_pkey";

/// Diesel-backed implementation of [`GroupRepository`].
#[derive(Clone)]
pub struct DieselGroupRepository {
    pool: DbPool,
}

impl DieselGroupRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a transaction: either the database or a row that cannot
/// become a domain value.
#[derive(Debug)]
enum TransactionError {
    Diesel(diesel::result::Error),
    Row(String),
}

impl From<diesel::result::Error> for TransactionError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> GroupRepositoryError {
    map_basic_pool_error(error, GroupRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> GroupRepositoryError {
    map_basic_diesel_error(
        error,
        GroupRepositoryError::query,
        GroupRepositoryError::connection,
    )
}

/// Translate constraint violations on group and membership writes.
fn map_write_error(
    error: diesel::result::Error,
    name: &str,
    project_id: Option<ProjectId>,
) -> GroupRepositoryError {
    match (violated_unique_constraint(&error), project_id) {
        (Some(NAME_CONSTRAINT), _) => GroupRepositoryError::duplicate_name(name),
        (Some(MEMBERSHIP_KEY), Some(project_id)) => {
            GroupRepositoryError::already_in_group_set(project_id)
        }
        _ => map_diesel_error(error),
    }
}

fn member_count(raw: i64) -> Result<usize, GroupRepositoryError> {
    usize::try_from(raw).map_err(|_| GroupRepositoryError::query(format!("bad count {raw}")))
}

/// Attach member counts to loaded group rows, preserving row order.
async fn summaries(
    conn: &mut AsyncPgConnection,
    rows: Vec<GroupRow>,
) -> Result<Vec<GroupSummary>, GroupRepositoryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let counts: HashMap<Uuid, i64> = group_memberships::table
        .filter(group_memberships::group_id.eq_any(&ids))
        .group_by(group_memberships::group_id)
        .select((group_memberships::group_id, diesel::dsl::count_star()))
        .load::<(Uuid, i64)>(conn)
        .await
        .map_err(map_diesel_error)?
        .into_iter()
        .collect();

    rows.into_iter()
        .map(|row| {
            let count = member_count(counts.get(&row.id).copied().unwrap_or(0))?;
            let group = row.into_domain().map_err(GroupRepositoryError::query)?;
            Ok(GroupSummary {
                group,
                member_count: count,
            })
        })
        .collect()
}

#[async_trait]
impl GroupRepository for DieselGroupRepository {
    async fn list_for_group_set(
        &self,
        group_set_id: &GroupSetId,
    ) -> Result<Vec<GroupSummary>, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<GroupRow> = groups::table
            .filter(groups::group_set_id.eq(group_set_id.as_uuid()))
            .select(GroupRow::as_select())
            .order_by(groups::number.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        summaries(&mut conn, rows).await
    }

    async fn list_for_unit(
        &self,
        unit_id: &UnitId,
    ) -> Result<Vec<GroupSummary>, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<GroupRow> = groups::table
            .inner_join(group_sets::table)
            .filter(group_sets::unit_id.eq(unit_id.as_uuid()))
            .select(GroupRow::as_select())
            .order_by((groups::group_set_id.asc(), groups::number.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        summaries(&mut conn, rows).await
    }

    async fn find(&self, id: &GroupId) -> Result<Option<GroupSummary>, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<GroupRow> = groups::table
            .find(id.as_uuid())
            .select(GroupRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(summaries(&mut conn, vec![row]).await?.pop())
    }

    async fn create(
        &self,
        draft: GroupDraft,
        first_member: Option<ProjectId>,
    ) -> Result<Group, GroupRepositoryError> {
        let name = draft.name().as_ref().to_owned();
        let set_id = *draft.group_set_id().as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result = conn
            .transaction::<_, TransactionError, _>(|conn| {
                async move {
                    group_sets::table
                        .find(set_id)
                        .select(group_sets::id)
                        .for_update()
                        .first::<Uuid>(conn)
                        .await?;

                    let highest: Option<i32> = groups::table
                        .filter(groups::group_set_id.eq(set_id))
                        .select(diesel::dsl::max(groups::number))
                        .first(conn)
                        .await?;
                    let next = highest.unwrap_or(0).saturating_add(1);
                    let number = u32::try_from(next)
                        .map_err(|_| TransactionError::Row(format!("bad group number {next}")))?;
                    let group = draft
                        .into_group(number)
                        .map_err(|err| TransactionError::Row(err.to_string()))?;

                    let row = NewGroupRow::from_domain(&group).map_err(TransactionError::Row)?;
                    diesel::insert_into(groups::table)
                        .values(&row)
                        .execute(conn)
                        .await?;

                    if let Some(project_id) = first_member {
                        diesel::insert_into(group_memberships::table)
                            .values(NewMembershipRow {
                                group_set_id: set_id,
                                project_id: *project_id.as_uuid(),
                                group_id: *group.id().as_uuid(),
                            })
                            .execute(conn)
                            .await?;
                    }
                    Ok(group)
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|err| match err {
            TransactionError::Diesel(error) => map_write_error(error, &name, first_member),
            TransactionError::Row(message) => GroupRepositoryError::query(message),
        })
    }

    async fn update(&self, group: &Group) -> Result<(), GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(groups::table.find(group.id().as_uuid()))
            .set(GroupUpdateRow::from(group))
            .execute(&mut conn)
            .await
            .map_err(|err| map_write_error(err, group.name().as_ref(), None))?;
        if updated == 0 {
            return Err(GroupRepositoryError::query(format!(
                "group {} does not exist",
                group.id()
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: &GroupId) -> Result<bool, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(groups::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn members(&self, id: &GroupId) -> Result<Vec<ProjectId>, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<Uuid> = group_memberships::table
            .filter(group_memberships::group_id.eq(id.as_uuid()))
            .select(group_memberships::project_id)
            .order_by(group_memberships::project_id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ids.into_iter().map(ProjectId::from_uuid).collect())
    }

    async fn group_of_project(
        &self,
        group_set_id: &GroupSetId,
        project_id: &ProjectId,
    ) -> Result<Option<GroupId>, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let group_id: Option<Uuid> = group_memberships::table
            .find((group_set_id.as_uuid(), project_id.as_uuid()))
            .select(group_memberships::group_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(group_id.map(GroupId::from_uuid))
    }

    async fn add_member(
        &self,
        id: &GroupId,
        project_id: &ProjectId,
    ) -> Result<(), GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let set_id: Uuid = groups::table
            .find(id.as_uuid())
            .select(groups::group_set_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .ok_or_else(|| GroupRepositoryError::query(format!("group {id} does not exist")))?;
        diesel::insert_into(group_memberships::table)
            .values(NewMembershipRow {
                group_set_id: set_id,
                project_id: *project_id.as_uuid(),
                group_id: *id.as_uuid(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, "", Some(*project_id)))
    }

    async fn remove_member(
        &self,
        id: &GroupId,
        project_id: &ProjectId,
    ) -> Result<bool, GroupRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            group_memberships::table
                .filter(group_memberships::group_id.eq(id.as_uuid()))
                .filter(group_memberships::project_id.eq(project_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unrelated_errors_fall_back_to_query() {
        let err = map_write_error(diesel::result::Error::NotFound, "Alpha", None);
        assert!(matches!(err, GroupRepositoryError::Query { .. }));
    }

    #[rstest]
    fn negative_counts_are_rejected() {
        assert!(member_count(-1).is_err());
        assert_eq!(member_count(3).expect("valid"), 3);
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, GroupRepositoryError::Connection { .. }));
    }
}
