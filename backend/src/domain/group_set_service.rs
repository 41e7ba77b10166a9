//! Group set domain service.
//!
//! Implements the group set driving ports. Every operation resolves the
//! caller's role on the unit and authorizes before touching the payload.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::authorization::{
    GroupAction, authorize, can_create_group_set, can_delete_group_set, can_update_group_set,
    can_view_group_sets,
};
use crate::domain::ports::{
    CreateGroupSetRequest, DeleteGroupSetRequest, GroupSetCommand, GroupSetQuery,
    GroupSetRepository, GroupSetRepositoryError, GroupSetUpdate, ListGroupSetsRequest,
    UnitRepository, UpdateGroupSetRequest,
};
use crate::domain::unit_access::resolve_actor;
use crate::domain::{
    Error, GroupCapacity, GroupSet, GroupSetChanges, GroupSetId, GroupSetName, GroupSetPolicy,
    GroupSetValidationError, NewGroupSet, UnitId,
};

pub(crate) fn map_group_set_repository_error(error: GroupSetRepositoryError) -> Error {
    match error {
        GroupSetRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("group set repository unavailable: {message}"))
        }
        GroupSetRepositoryError::Query { message } => {
            Error::internal(format!("group set repository error: {message}"))
        }
        GroupSetRepositoryError::DuplicateName { name } => {
            Error::conflict(format!("a group set named {name} already exists in this unit"))
        }
    }
}

fn invalid(err: GroupSetValidationError) -> Error {
    Error::invalid_request(format!("invalid group set: {err}"))
}

fn parse_capacity(raw: Option<u32>) -> Result<Option<GroupCapacity>, Error> {
    raw.map(GroupCapacity::new).transpose().map_err(invalid)
}

fn parse_changes(update: GroupSetUpdate) -> Result<GroupSetChanges, Error> {
    let name = update
        .name
        .map(GroupSetName::new)
        .transpose()
        .map_err(invalid)?;
    let capacity = update.capacity.map(parse_capacity).transpose()?;
    Ok(GroupSetChanges {
        name,
        allow_students_to_create_groups: update.allow_students_to_create_groups,
        allow_students_to_manage_groups: update.allow_students_to_manage_groups,
        keep_groups_in_same_class: update.keep_groups_in_same_class,
        capacity,
    })
}

/// Load a group set and check it belongs to the unit in the path.
pub(crate) async fn find_group_set_in_unit<S>(
    group_sets: &S,
    unit_id: UnitId,
    group_set_id: GroupSetId,
) -> Result<GroupSet, Error>
where
    S: GroupSetRepository + ?Sized,
{
    group_sets
        .find(&group_set_id)
        .await
        .map_err(map_group_set_repository_error)?
        .filter(|set| set.unit_id() == unit_id)
        .ok_or_else(|| {
            Error::not_found(format!("group set {group_set_id} not found in unit {unit_id}"))
        })
}

/// Group set service implementing the command and query driving ports.
#[derive(Clone)]
pub struct GroupSetService<U, S> {
    units: Arc<U>,
    group_sets: Arc<S>,
}

impl<U, S> GroupSetService<U, S> {
    /// Create a service over the unit and group set repositories.
    pub fn new(units: Arc<U>, group_sets: Arc<S>) -> Self {
        Self { units, group_sets }
    }
}

#[async_trait]
impl<U, S> GroupSetCommand for GroupSetService<U, S>
where
    U: UnitRepository,
    S: GroupSetRepository,
{
    async fn create_group_set(&self, request: CreateGroupSetRequest) -> Result<GroupSet, Error> {
        let CreateGroupSetRequest {
            actor,
            unit_id,
            group_set: input,
        } = request;
        let action = GroupAction::CreateGroupSet;
        let actor = resolve_actor(self.units.as_ref(), actor, unit_id, action).await?;
        authorize(can_create_group_set(&actor), &actor, action)?;

        let name = GroupSetName::new(&input.name).map_err(invalid)?;
        let capacity = parse_capacity(input.capacity)?;
        let policy = GroupSetPolicy {
            allow_students_to_create_groups: input.allow_students_to_create_groups.unwrap_or(false),
            allow_students_to_manage_groups: input.allow_students_to_manage_groups.unwrap_or(false),
            keep_groups_in_same_class: input.keep_groups_in_same_class.unwrap_or(false),
        };
        let group_set = GroupSet::create(
            GroupSetId::random(),
            unit_id,
            NewGroupSet {
                name,
                policy,
                capacity,
            },
        );

        self.group_sets
            .insert(&group_set)
            .await
            .map_err(map_group_set_repository_error)?;
        info!(
            group_set_id = %group_set.id(),
            unit_id = %unit_id,
            user_id = %actor.user_id(),
            "group set created"
        );
        Ok(group_set)
    }

    async fn update_group_set(&self, request: UpdateGroupSetRequest) -> Result<GroupSet, Error> {
        let UpdateGroupSetRequest {
            actor,
            unit_id,
            group_set_id,
            changes,
        } = request;
        let action = GroupAction::UpdateGroupSet;
        let actor = resolve_actor(self.units.as_ref(), actor, unit_id, action).await?;
        authorize(can_update_group_set(&actor), &actor, action)?;

        let mut group_set =
            find_group_set_in_unit(self.group_sets.as_ref(), unit_id, group_set_id).await?;
        let changes = parse_changes(changes)?;
        group_set.apply(changes);
        self.group_sets
            .update(&group_set)
            .await
            .map_err(map_group_set_repository_error)?;
        info!(group_set_id = %group_set_id, user_id = %actor.user_id(), "group set updated");
        Ok(group_set)
    }

    async fn delete_group_set(&self, request: DeleteGroupSetRequest) -> Result<(), Error> {
        let DeleteGroupSetRequest {
            actor,
            unit_id,
            group_set_id,
        } = request;
        let action = GroupAction::DeleteGroupSet;
        let actor = resolve_actor(self.units.as_ref(), actor, unit_id, action).await?;
        authorize(can_delete_group_set(&actor), &actor, action)?;

        find_group_set_in_unit(self.group_sets.as_ref(), unit_id, group_set_id).await?;
        let deleted = self
            .group_sets
            .delete(&group_set_id)
            .await
            .map_err(map_group_set_repository_error)?;
        if !deleted {
            return Err(Error::not_found(format!(
                "group set {group_set_id} not found in unit {unit_id}"
            )));
        }
        info!(group_set_id = %group_set_id, user_id = %actor.user_id(), "group set deleted");
        Ok(())
    }
}

#[async_trait]
impl<U, S> GroupSetQuery for GroupSetService<U, S>
where
    U: UnitRepository,
    S: GroupSetRepository,
{
    async fn list_group_sets(&self, request: ListGroupSetsRequest) -> Result<Vec<GroupSet>, Error> {
        let action = GroupAction::ViewGroupSets;
        let actor =
            resolve_actor(self.units.as_ref(), request.actor, request.unit_id, action).await?;
        authorize(can_view_group_sets(&actor), &actor, action)?;
        self.group_sets
            .list_for_unit(&request.unit_id)
            .await
            .map_err(map_group_set_repository_error)
    }
}

#[cfg(test)]
#[path = "group_set_service_tests.rs"]
mod tests;
