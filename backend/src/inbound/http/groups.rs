//! Group and membership HTTP handlers.
//!
//! ```text
//! GET    /api/v1/units/{unit_id}/groups
//! GET    /api/v1/units/{unit_id}/group_sets/{group_set_id}/groups
//! POST   /api/v1/units/{unit_id}/group_sets/{group_set_id}/groups {"group":{"name":"Alpha","tutorial_id":"..."}}
//! GET    /api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}
//! PUT    /api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id} {"group":{"locked":true}}
//! DELETE /api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}
//! GET    /api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}/members
//! POST   /api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}/members {"project_id":"..."}
//! DELETE /api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}/members/{project_id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    CreateGroupRequest, DeleteGroupRequest, GetGroupRequest, GroupInput, GroupPath,
    GroupSetPath, GroupUpdate, ListGroupsRequest, ListUnitGroupsRequest, MemberRequest,
    UpdateGroupRequest,
};
use crate::domain::{Error, GroupSummary, ProjectId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::group_sets::{UnitPathParams, parse_unit_id};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    GROUP_ID, GROUP_SET_ID, PROJECT_ID, UNIT_ID, missing_field_error, parse_id,
};

#[derive(Debug, Deserialize)]
struct GroupSetPathParams {
    unit_id: String,
    group_set_id: String,
}

#[derive(Debug, Deserialize)]
struct GroupPathParams {
    unit_id: String,
    group_set_id: String,
    group_id: String,
}

#[derive(Debug, Deserialize)]
struct MemberPathParams {
    unit_id: String,
    group_set_id: String,
    group_id: String,
    project_id: String,
}

/// Fields accepted when creating a group.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct NewGroupPayload {
    #[schema(example = "Alpha")]
    pub name: Option<String>,
    /// Optional for students, who default to their own tutorial.
    pub tutorial_id: Option<String>,
    /// Staff only.
    pub capacity_adjustment: Option<i32>,
}

/// Request body for creating a group.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateGroupBody {
    pub group: NewGroupPayload,
}

/// Fields accepted when updating a group. Absent fields are unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub tutorial_id: Option<String>,
    pub capacity_adjustment: Option<i32>,
    /// Staff only, whatever the group set allows students to manage.
    pub locked: Option<bool>,
}

/// Request body for updating a group.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateGroupBody {
    pub group: GroupPatch,
}

/// Request body for adding a project to a group.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct AddMemberBody {
    pub project_id: Option<String>,
}

/// Group as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub tutorial_id: String,
    pub group_set_id: String,
    #[schema(example = 1)]
    pub number: u32,
    pub locked: bool,
    pub capacity_adjustment: i32,
    pub member_count: usize,
}

/// One member of a group.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    pub project_id: String,
}

impl From<GroupSummary> for GroupResponse {
    fn from(summary: GroupSummary) -> Self {
        let GroupSummary {
            group,
            member_count,
        } = summary;
        Self {
            id: group.id().to_string(),
            name: group.name().as_ref().to_owned(),
            tutorial_id: group.tutorial_id().to_string(),
            group_set_id: group.group_set_id().to_string(),
            number: group.number(),
            locked: group.is_locked(),
            capacity_adjustment: group.capacity_adjustment(),
            member_count,
        }
    }
}

impl From<NewGroupPayload> for GroupInput {
    fn from(payload: NewGroupPayload) -> Self {
        Self {
            name: payload.name.unwrap_or_default(),
            tutorial_id: payload.tutorial_id,
            capacity_adjustment: payload.capacity_adjustment,
        }
    }
}

impl From<GroupPatch> for GroupUpdate {
    fn from(patch: GroupPatch) -> Self {
        Self {
            name: patch.name,
            tutorial_id: patch.tutorial_id,
            capacity_adjustment: patch.capacity_adjustment,
            locked: patch.locked,
        }
    }
}

fn parse_group_set_path(path: &GroupSetPathParams) -> Result<GroupSetPath, Error> {
    Ok(GroupSetPath {
        unit_id: parse_id(&path.unit_id, UNIT_ID)?,
        group_set_id: parse_id(&path.group_set_id, GROUP_SET_ID)?,
    })
}

fn parse_group_path(path: &GroupPathParams) -> Result<GroupPath, Error> {
    Ok(GroupPath {
        unit_id: parse_id(&path.unit_id, UNIT_ID)?,
        group_set_id: parse_id(&path.group_set_id, GROUP_SET_ID)?,
        group_id: parse_id(&path.group_id, GROUP_ID)?,
    })
}

fn parse_member_path(path: &MemberPathParams) -> Result<(GroupPath, ProjectId), Error> {
    let group = GroupPath {
        unit_id: parse_id(&path.unit_id, UNIT_ID)?,
        group_set_id: parse_id(&path.group_set_id, GROUP_SET_ID)?,
        group_id: parse_id(&path.group_id, GROUP_ID)?,
    };
    Ok((group, parse_id(&path.project_id, PROJECT_ID)?))
}

fn parse_member_body(body: AddMemberBody) -> Result<ProjectId, Error> {
    let raw = body
        .project_id
        .ok_or_else(|| missing_field_error(PROJECT_ID))?;
    parse_id(&raw, PROJECT_ID)
}

fn responses(groups: Vec<GroupSummary>) -> Vec<GroupResponse> {
    groups.into_iter().map(GroupResponse::from).collect()
}

/// List every group in a unit. Staff only.
#[utoipa::path(
    get,
    path = "/api/v1/units/{unit_id}/groups",
    params(("unit_id" = String, Path, description = "Unit identifier")),
    responses(
        (status = 200, description = "Groups of the unit", body = [GroupResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unit not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "listUnitGroups"
)]
#[get("/units/{unit_id}/groups")]
pub async fn list_unit_groups(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<UnitPathParams>,
) -> ApiResult<web::Json<Vec<GroupResponse>>> {
    let actor = session.require_user_id()?;
    let unit_id = parse_unit_id(&path)?;
    let groups = state
        .groups_query
        .list_unit_groups(ListUnitGroupsRequest { actor, unit_id })
        .await?;
    Ok(web::Json(responses(groups)))
}

/// List the groups of a group set. Staff only.
#[utoipa::path(
    get,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}/groups",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier")
    ),
    responses(
        (status = 200, description = "Groups of the group set", body = [GroupResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "listGroups"
)]
#[get("/units/{unit_id}/group_sets/{group_set_id}/groups")]
pub async fn list_groups(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<GroupSetPathParams>,
) -> ApiResult<web::Json<Vec<GroupResponse>>> {
    let actor = session.require_user_id()?;
    let path = parse_group_set_path(&path)?;
    let groups = state
        .groups_query
        .list_groups(ListGroupsRequest { actor, path })
        .await?;
    Ok(web::Json(responses(groups)))
}

/// Create a group. Staff always; students when the group set allows it.
#[utoipa::path(
    post,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}/groups",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier")
    ),
    request_body = CreateGroupBody,
    responses(
        (status = 201, description = "Group created unlocked", body = GroupResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Duplicate name or existing membership", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "createGroup"
)]
#[post("/units/{unit_id}/group_sets/{group_set_id}/groups")]
pub async fn create_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<GroupSetPathParams>,
    payload: web::Json<CreateGroupBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let path = parse_group_set_path(&path)?;
    let group = GroupInput::from(payload.into_inner().group);
    let summary = state
        .groups
        .create_group(CreateGroupRequest { actor, path, group })
        .await?;
    Ok(HttpResponse::Created().json(GroupResponse::from(summary)))
}

/// Fetch one group. Staff, or a student member.
#[utoipa::path(
    get,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier"),
        ("group_id" = String, Path, description = "Group identifier")
    ),
    responses(
        (status = 200, description = "Group", body = GroupResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "getGroup"
)]
#[get("/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}")]
pub async fn get_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<GroupPathParams>,
) -> ApiResult<web::Json<GroupResponse>> {
    let actor = session.require_user_id()?;
    let path = parse_group_path(&path)?;
    let summary = state
        .groups_query
        .get_group(GetGroupRequest { actor, path })
        .await?;
    Ok(web::Json(summary.into()))
}

/// Update a group's name, tutorial, capacity adjustment or lock state.
///
/// Every present field is authorized before any is applied; a denied field
/// rejects the whole request and leaves the group unchanged.
#[utoipa::path(
    put,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier"),
        ("group_id" = String, Path, description = "Group identifier")
    ),
    request_body = UpdateGroupBody,
    responses(
        (status = 200, description = "Updated group", body = GroupResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden; nothing changed", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Duplicate name", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "updateGroup"
)]
#[put("/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}")]
pub async fn update_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<GroupPathParams>,
    payload: web::Json<UpdateGroupBody>,
) -> ApiResult<web::Json<GroupResponse>> {
    let actor = session.require_user_id()?;
    let path = parse_group_path(&path)?;
    let changes = GroupUpdate::from(payload.into_inner().group);
    let summary = state
        .groups
        .update_group(UpdateGroupRequest {
            actor,
            path,
            changes,
        })
        .await?;
    Ok(web::Json(summary.into()))
}

/// Delete a group and its memberships. Staff only.
#[utoipa::path(
    delete,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier"),
        ("group_id" = String, Path, description = "Group identifier")
    ),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "deleteGroup"
)]
#[delete("/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}")]
pub async fn delete_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<GroupPathParams>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let path = parse_group_path(&path)?;
    state
        .groups
        .delete_group(DeleteGroupRequest { actor, path })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// List the projects in a group. Staff, or a student member.
#[utoipa::path(
    get,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}/members",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier"),
        ("group_id" = String, Path, description = "Group identifier")
    ),
    responses(
        (status = 200, description = "Members of the group", body = [MemberResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "listMembers"
)]
#[get("/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}/members")]
pub async fn list_members(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<GroupPathParams>,
) -> ApiResult<web::Json<Vec<MemberResponse>>> {
    let actor = session.require_user_id()?;
    let path = parse_group_path(&path)?;
    let members = state
        .groups_query
        .list_members(GetGroupRequest { actor, path })
        .await?;
    Ok(web::Json(
        members
            .into_iter()
            .map(|project_id| MemberResponse {
                project_id: project_id.to_string(),
            })
            .collect(),
    ))
}

/// Add a project to a group.
#[utoipa::path(
    post,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}/members",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier"),
        ("group_id" = String, Path, description = "Group identifier")
    ),
    request_body = AddMemberBody,
    responses(
        (status = 201, description = "Project added; returns the group", body = GroupResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Already grouped or group full", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "addMember"
)]
#[post("/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}/members")]
pub async fn add_member(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<GroupPathParams>,
    payload: web::Json<AddMemberBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let path = parse_group_path(&path)?;
    let project_id = parse_member_body(payload.into_inner())?;
    let summary = state
        .groups
        .add_member(MemberRequest {
            actor,
            path,
            project_id,
        })
        .await?;
    Ok(HttpResponse::Created().json(GroupResponse::from(summary)))
}

/// Remove a project from a group.
#[utoipa::path(
    delete,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}/members/{project_id}",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier"),
        ("group_id" = String, Path, description = "Group identifier"),
        ("project_id" = String, Path, description = "Project identifier")
    ),
    responses(
        (status = 204, description = "Project removed"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "removeMember"
)]
#[delete("/units/{unit_id}/group_sets/{group_set_id}/groups/{group_id}/members/{project_id}")]
pub async fn remove_member(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<MemberPathParams>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let (path, project_id) = parse_member_path(&path)?;
    state
        .groups
        .remove_member(MemberRequest {
            actor,
            path,
            project_id,
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "groups_tests.rs"]
mod tests;
