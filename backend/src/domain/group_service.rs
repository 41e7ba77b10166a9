//! Group domain service.
//!
//! Implements the group driving ports: creation, the per-field authorized
//! update (including the lock state machine), deletion and membership.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::authorization::{
    Actor, GroupAction, authorize, can_adjust_capacity, can_change_group_tutorial,
    can_change_membership, can_create_group, can_delete_group, can_list_groups, can_manage_group,
    can_update_group_lock, can_view_group,
};
use crate::domain::group_set_service::find_group_set_in_unit;
use crate::domain::membership::{JoinCandidate, check_join};
use crate::domain::ports::{
    CreateGroupRequest, DeleteGroupRequest, GetGroupRequest, GroupCommand, GroupPath,
    GroupQuery, GroupRepository, GroupRepositoryError, GroupSetRepository, GroupUpdate,
    ListGroupsRequest, ListUnitGroupsRequest, MemberRequest, UnitRepository, UpdateGroupRequest,
};
use crate::domain::unit_access::{map_unit_repository_error, resolve_actor};
use crate::domain::{
    Error, GroupDraft, GroupId, GroupName, GroupSet, GroupSummary, GroupValidationError,
    LockTransition, NewGroup, ProjectId, Tutorial, TutorialId, UserId,
};

pub(crate) fn map_group_repository_error(error: GroupRepositoryError) -> Error {
    match error {
        GroupRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("group repository unavailable: {message}"))
        }
        GroupRepositoryError::Query { message } => {
            Error::internal(format!("group repository error: {message}"))
        }
        GroupRepositoryError::DuplicateName { name } => {
            Error::conflict(format!("a group named {name} already exists in this group set"))
        }
        GroupRepositoryError::AlreadyInGroupSet { project_id } => Error::conflict(format!(
            "project {project_id} is already in a group of this group set"
        )),
    }
}

fn invalid(err: GroupValidationError) -> Error {
    Error::invalid_request(format!("invalid group: {err}"))
}

/// Resources a group operation acts on, resolved and checked against the
/// request path.
struct GroupContext {
    actor: Actor,
    group_set: GroupSet,
    summary: GroupSummary,
    is_member: bool,
}

/// Group service implementing the command and query driving ports.
#[derive(Clone)]
pub struct GroupService<U, S, G> {
    units: Arc<U>,
    group_sets: Arc<S>,
    groups: Arc<G>,
}

impl<U, S, G> GroupService<U, S, G> {
    /// Create a service over the unit, group set and group repositories.
    pub fn new(units: Arc<U>, group_sets: Arc<S>, groups: Arc<G>) -> Self {
        Self {
            units,
            group_sets,
            groups,
        }
    }
}

impl<U, S, G> GroupService<U, S, G>
where
    U: UnitRepository,
    S: GroupSetRepository,
    G: GroupRepository,
{
    async fn load_group(
        &self,
        user: UserId,
        path: GroupPath,
        action: GroupAction,
    ) -> Result<GroupContext, Error> {
        let actor = resolve_actor(self.units.as_ref(), user, path.unit_id, action).await?;
        self.load_group_for(actor, path).await
    }

    /// Resolve the group set and group named by `path` for an already
    /// resolved actor.
    async fn load_group_for(&self, actor: Actor, path: GroupPath) -> Result<GroupContext, Error> {
        let group_set =
            find_group_set_in_unit(self.group_sets.as_ref(), path.unit_id, path.group_set_id)
                .await?;
        let summary = self
            .groups
            .find(&path.group_id)
            .await
            .map_err(map_group_repository_error)?
            .filter(|summary| summary.group.group_set_id() == group_set.id())
            .ok_or_else(|| {
                Error::not_found(format!(
                    "group {} not found in group set {}",
                    path.group_id, path.group_set_id
                ))
            })?;
        let is_member = match actor.project() {
            Some(project) => {
                self.current_group(&group_set, project.id).await? == Some(path.group_id)
            }
            None => false,
        };
        Ok(GroupContext {
            actor,
            group_set,
            summary,
            is_member,
        })
    }

    async fn current_group(
        &self,
        group_set: &GroupSet,
        project_id: ProjectId,
    ) -> Result<Option<GroupId>, Error> {
        self.groups
            .group_of_project(&group_set.id(), &project_id)
            .await
            .map_err(map_group_repository_error)
    }

    /// Look up a tutorial named in a payload. Missing or foreign tutorials
    /// are payload errors rather than missing path resources.
    async fn payload_tutorial(&self, tutorial_id: TutorialId) -> Result<Tutorial, Error> {
        self.units
            .find_tutorial(&tutorial_id)
            .await
            .map_err(map_unit_repository_error)?
            .ok_or_else(|| Error::invalid_request(format!("tutorial {tutorial_id} does not exist")))
    }

    async fn member_count(&self, group_id: GroupId) -> Result<usize, Error> {
        self.groups
            .members(&group_id)
            .await
            .map(|members| members.len())
            .map_err(map_group_repository_error)
    }

    /// Rules that depend only on the actor's role. Checked before any group
    /// set or group lookup.
    fn authorize_role_changes(actor: &Actor, changes: &GroupUpdate) -> Result<(), Error> {
        if changes.tutorial_id.is_some() {
            authorize(
                can_change_group_tutorial(actor),
                actor,
                GroupAction::ChangeGroupTutorial,
            )?;
        }
        if changes.capacity_adjustment.is_some() {
            authorize(
                can_adjust_capacity(actor),
                actor,
                GroupAction::AdjustGroupCapacity,
            )?;
        }
        if changes.locked.is_some() {
            authorize(
                can_update_group_lock(actor),
                actor,
                GroupAction::UpdateGroupLock,
            )?;
        }
        Ok(())
    }

    /// Rules that need the group and the caller's membership of it.
    fn authorize_group_changes(context: &GroupContext, changes: &GroupUpdate) -> Result<(), Error> {
        let GroupContext {
            actor,
            group_set,
            summary,
            is_member,
        } = context;
        if changes.is_empty() {
            return authorize(can_view_group(actor, *is_member), actor, GroupAction::ViewGroup);
        }
        if changes.name.is_some() {
            authorize(
                can_manage_group(actor, group_set, &summary.group, *is_member),
                actor,
                GroupAction::RenameGroup,
            )?;
        }
        Ok(())
    }
}

/// Parse a tutorial id carried in a request body.
fn parse_tutorial_id(raw: &str) -> Result<TutorialId, Error> {
    raw.parse::<TutorialId>().map_err(|_| {
        Error::invalid_request("tutorial_id must be a valid UUID").with_details(json!({
            "field": "tutorial_id",
            "value": raw,
            "code": "invalid_uuid",
        }))
    })
}

#[async_trait]
impl<U, S, G> GroupCommand for GroupService<U, S, G>
where
    U: UnitRepository,
    S: GroupSetRepository,
    G: GroupRepository,
{
    async fn create_group(&self, request: CreateGroupRequest) -> Result<GroupSummary, Error> {
        let CreateGroupRequest {
            actor,
            path,
            group: input,
        } = request;
        let action = GroupAction::CreateGroup;
        let actor = resolve_actor(self.units.as_ref(), actor, path.unit_id, action).await?;
        let group_set =
            find_group_set_in_unit(self.group_sets.as_ref(), path.unit_id, path.group_set_id)
                .await?;
        authorize(can_create_group(&actor, &group_set), &actor, action)?;
        if input.capacity_adjustment.is_some_and(|adjustment| adjustment != 0) {
            authorize(
                can_adjust_capacity(&actor),
                &actor,
                GroupAction::AdjustGroupCapacity,
            )?;
        }

        let name = GroupName::new(&input.name).map_err(invalid)?;
        let student_project = if actor.is_staff() {
            None
        } else {
            actor.project().cloned()
        };
        let tutorial_id = match input.tutorial_id.as_deref() {
            Some(raw) => parse_tutorial_id(raw)?,
            None => student_project
                .as_ref()
                .and_then(|p| p.tutorial_id)
                .ok_or_else(|| Error::invalid_request("tutorial_id is required"))?,
        };
        let tutorial = self.payload_tutorial(tutorial_id).await?;

        if let Some(project) = &student_project {
            if group_set.keeps_groups_in_same_class() && project.tutorial_id != Some(tutorial.id) {
                return Err(Error::invalid_request(
                    "students may only create groups in their own tutorial",
                ));
            }
            if let Some(existing) = self.current_group(&group_set, project.id).await? {
                return Err(Error::conflict(format!(
                    "already a member of group {existing} in this group set"
                )));
            }
        }

        let draft = GroupDraft::new(
            GroupId::random(),
            &group_set,
            &tutorial,
            NewGroup {
                name,
                tutorial_id: tutorial.id,
                capacity_adjustment: input.capacity_adjustment.unwrap_or(0),
            },
        )
        .map_err(invalid)?;
        let first_member = student_project.as_ref().map(|p| p.id);
        let group = self
            .groups
            .create(draft, first_member)
            .await
            .map_err(map_group_repository_error)?;
        info!(
            group_id = %group.id(),
            group_set_id = %group_set.id(),
            number = group.number(),
            user_id = %actor.user_id(),
            "group created"
        );
        Ok(GroupSummary {
            group,
            member_count: usize::from(first_member.is_some()),
        })
    }

    async fn update_group(&self, request: UpdateGroupRequest) -> Result<GroupSummary, Error> {
        let UpdateGroupRequest {
            actor,
            path,
            changes,
        } = request;
        let actor =
            resolve_actor(self.units.as_ref(), actor, path.unit_id, GroupAction::ViewGroup).await?;
        Self::authorize_role_changes(&actor, &changes)?;
        let context = self.load_group_for(actor, path).await?;
        Self::authorize_group_changes(&context, &changes)?;

        let GroupContext {
            actor,
            group_set,
            summary,
            ..
        } = context;
        let GroupSummary {
            mut group,
            member_count,
        } = summary;
        let name = changes.name.map(GroupName::new).transpose().map_err(invalid)?;
        let tutorial = match changes.tutorial_id.as_deref() {
            Some(raw) => Some(self.payload_tutorial(parse_tutorial_id(raw)?).await?),
            None => None,
        };

        let original = group.clone();
        if let Some(name) = name {
            group.rename(name);
        }
        if let Some(tutorial) = &tutorial {
            group.change_tutorial(&group_set, tutorial).map_err(invalid)?;
        }
        if let Some(adjustment) = changes.capacity_adjustment {
            group.set_capacity_adjustment(adjustment);
        }
        if let Some(locked) = changes.locked {
            match group.set_locked(locked) {
                LockTransition::Unchanged => {
                    debug!(group_id = %group.id(), locked, "lock state already as requested");
                }
                transition => {
                    info!(
                        group_id = %group.id(),
                        user_id = %actor.user_id(),
                        ?transition,
                        "group lock state changed"
                    );
                }
            }
        }

        if group != original {
            self.groups
                .update(&group)
                .await
                .map_err(map_group_repository_error)?;
        }
        Ok(GroupSummary {
            group,
            member_count,
        })
    }

    async fn delete_group(&self, request: DeleteGroupRequest) -> Result<(), Error> {
        let DeleteGroupRequest { actor, path } = request;
        let action = GroupAction::DeleteGroup;
        let actor = resolve_actor(self.units.as_ref(), actor, path.unit_id, action).await?;
        authorize(can_delete_group(&actor), &actor, action)?;
        let context = self.load_group_for(actor, path).await?;
        let group_id = context.summary.group.id();
        let deleted = self
            .groups
            .delete(&group_id)
            .await
            .map_err(map_group_repository_error)?;
        if !deleted {
            return Err(Error::not_found(format!("group {group_id} not found")));
        }
        info!(group_id = %group_id, user_id = %context.actor.user_id(), "group deleted");
        Ok(())
    }

    async fn add_member(&self, request: MemberRequest) -> Result<GroupSummary, Error> {
        let MemberRequest {
            actor,
            path,
            project_id,
        } = request;
        let action = GroupAction::ManageMembers;
        let context = self.load_group(actor, path, action).await?;
        let GroupContext {
            actor,
            group_set,
            summary,
            ..
        } = context;
        authorize(
            can_change_membership(&actor, &group_set, &summary.group, project_id),
            &actor,
            action,
        )?;

        let project = self
            .units
            .find_project(&project_id)
            .await
            .map_err(map_unit_repository_error)?
            .ok_or_else(|| Error::not_found(format!("project {project_id} not found")))?;
        let current_group = self.current_group(&group_set, project_id).await?;
        check_join(JoinCandidate {
            group_set: &group_set,
            group: &summary.group,
            project: &project,
            current_group,
            member_count: summary.member_count,
            by_staff: actor.is_staff(),
        })?;

        let group_id = summary.group.id();
        self.groups
            .add_member(&group_id, &project_id)
            .await
            .map_err(map_group_repository_error)?;
        info!(
            group_id = %group_id,
            project_id = %project_id,
            user_id = %actor.user_id(),
            "member added"
        );
        let member_count = self.member_count(group_id).await?;
        Ok(GroupSummary {
            group: summary.group,
            member_count,
        })
    }

    async fn remove_member(&self, request: MemberRequest) -> Result<(), Error> {
        let MemberRequest {
            actor,
            path,
            project_id,
        } = request;
        let action = GroupAction::ManageMembers;
        let context = self.load_group(actor, path, action).await?;
        authorize(
            can_change_membership(
                &context.actor,
                &context.group_set,
                &context.summary.group,
                project_id,
            ),
            &context.actor,
            action,
        )?;
        let group_id = context.summary.group.id();
        let removed = self
            .groups
            .remove_member(&group_id, &project_id)
            .await
            .map_err(map_group_repository_error)?;
        if !removed {
            return Err(Error::not_found(format!(
                "project {project_id} is not a member of group {group_id}"
            )));
        }
        info!(
            group_id = %group_id,
            project_id = %project_id,
            user_id = %context.actor.user_id(),
            "member removed"
        );
        Ok(())
    }
}

#[async_trait]
impl<U, S, G> GroupQuery for GroupService<U, S, G>
where
    U: UnitRepository,
    S: GroupSetRepository,
    G: GroupRepository,
{
    async fn list_unit_groups(
        &self,
        request: ListUnitGroupsRequest,
    ) -> Result<Vec<GroupSummary>, Error> {
        let action = GroupAction::ListGroups;
        let actor =
            resolve_actor(self.units.as_ref(), request.actor, request.unit_id, action).await?;
        authorize(can_list_groups(&actor), &actor, action)?;
        self.groups
            .list_for_unit(&request.unit_id)
            .await
            .map_err(map_group_repository_error)
    }

    async fn list_groups(&self, request: ListGroupsRequest) -> Result<Vec<GroupSummary>, Error> {
        let ListGroupsRequest { actor, path } = request;
        let action = GroupAction::ListGroups;
        let actor = resolve_actor(self.units.as_ref(), actor, path.unit_id, action).await?;
        authorize(can_list_groups(&actor), &actor, action)?;
        let group_set =
            find_group_set_in_unit(self.group_sets.as_ref(), path.unit_id, path.group_set_id)
                .await?;
        self.groups
            .list_for_group_set(&group_set.id())
            .await
            .map_err(map_group_repository_error)
    }

    async fn get_group(&self, request: GetGroupRequest) -> Result<GroupSummary, Error> {
        let action = GroupAction::ViewGroup;
        let context = self.load_group(request.actor, request.path, action).await?;
        authorize(
            can_view_group(&context.actor, context.is_member),
            &context.actor,
            action,
        )?;
        Ok(context.summary)
    }

    async fn list_members(&self, request: GetGroupRequest) -> Result<Vec<ProjectId>, Error> {
        let action = GroupAction::ViewGroup;
        let context = self.load_group(request.actor, request.path, action).await?;
        authorize(
            can_view_group(&context.actor, context.is_member),
            &context.actor,
            action,
        )?;
        self.groups
            .members(&context.summary.group.id())
            .await
            .map_err(map_group_repository_error)
    }
}

#[cfg(test)]
#[path = "group_service_tests.rs"]
mod tests;
