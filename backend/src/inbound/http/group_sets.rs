//! Group set HTTP handlers.
//!
//! ```text
//! GET    /api/v1/units/{unit_id}/group_sets
//! POST   /api/v1/units/{unit_id}/group_sets {"group_set":{"name":"Assignment teams"}}
//! PUT    /api/v1/units/{unit_id}/group_sets/{group_set_id} {"group_set":{"capacity":null}}
//! DELETE /api/v1/units/{unit_id}/group_sets/{group_set_id}
//! ```
//!
//! Handlers only parse identifiers and reshape payloads. Role checks and
//! validation happen in the domain service, which authorizes first.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    CreateGroupSetRequest, DeleteGroupSetRequest, GroupSetInput, GroupSetUpdate,
    ListGroupSetsRequest, UpdateGroupSetRequest,
};
use crate::domain::{Error, GroupSet, GroupSetId, UnitId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{GROUP_SET_ID, UNIT_ID, deserialize_present, parse_id};

#[derive(Debug, Deserialize)]
pub(crate) struct UnitPathParams {
    pub(crate) unit_id: String,
}

#[derive(Debug, Deserialize)]
struct GroupSetPathParams {
    unit_id: String,
    group_set_id: String,
}

/// Fields accepted when creating a group set.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct NewGroupSetPayload {
    #[schema(example = "Assignment teams")]
    pub name: Option<String>,
    pub allow_students_to_create_groups: Option<bool>,
    pub allow_students_to_manage_groups: Option<bool>,
    pub keep_groups_in_same_class: Option<bool>,
    #[schema(minimum = 1)]
    pub capacity: Option<u32>,
}

/// Request body for `POST /units/{unit_id}/group_sets`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateGroupSetBody {
    pub group_set: NewGroupSetPayload,
}

/// Fields accepted when updating a group set. Absent fields are unchanged;
/// `"capacity": null` removes the cap.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GroupSetPatch {
    pub name: Option<String>,
    pub allow_students_to_create_groups: Option<bool>,
    pub allow_students_to_manage_groups: Option<bool>,
    pub keep_groups_in_same_class: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<u32>, nullable, minimum = 1)]
    pub capacity: Option<Option<u32>>,
}

/// Request body for `PUT /units/{unit_id}/group_sets/{group_set_id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateGroupSetBody {
    pub group_set: GroupSetPatch,
}

/// Group set as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupSetResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    pub unit_id: String,
    pub name: String,
    pub allow_students_to_create_groups: bool,
    pub allow_students_to_manage_groups: bool,
    pub keep_groups_in_same_class: bool,
    pub capacity: Option<u32>,
}

impl From<GroupSet> for GroupSetResponse {
    fn from(group_set: GroupSet) -> Self {
        let policy = group_set.policy();
        Self {
            id: group_set.id().to_string(),
            unit_id: group_set.unit_id().to_string(),
            name: group_set.name().as_ref().to_owned(),
            allow_students_to_create_groups: policy.allow_students_to_create_groups,
            allow_students_to_manage_groups: policy.allow_students_to_manage_groups,
            keep_groups_in_same_class: policy.keep_groups_in_same_class,
            capacity: group_set.capacity().map(u32::from),
        }
    }
}

impl From<NewGroupSetPayload> for GroupSetInput {
    fn from(payload: NewGroupSetPayload) -> Self {
        Self {
            name: payload.name.unwrap_or_default(),
            allow_students_to_create_groups: payload.allow_students_to_create_groups,
            allow_students_to_manage_groups: payload.allow_students_to_manage_groups,
            keep_groups_in_same_class: payload.keep_groups_in_same_class,
            capacity: payload.capacity,
        }
    }
}

impl From<GroupSetPatch> for GroupSetUpdate {
    fn from(patch: GroupSetPatch) -> Self {
        Self {
            name: patch.name,
            allow_students_to_create_groups: patch.allow_students_to_create_groups,
            allow_students_to_manage_groups: patch.allow_students_to_manage_groups,
            keep_groups_in_same_class: patch.keep_groups_in_same_class,
            capacity: patch.capacity,
        }
    }
}

pub(crate) fn parse_unit_id(path: &UnitPathParams) -> Result<UnitId, Error> {
    parse_id(&path.unit_id, UNIT_ID)
}

fn parse_group_set_path(path: &GroupSetPathParams) -> Result<(UnitId, GroupSetId), Error> {
    Ok((
        parse_id(&path.unit_id, UNIT_ID)?,
        parse_id(&path.group_set_id, GROUP_SET_ID)?,
    ))
}

/// List the group sets of a unit.
#[utoipa::path(
    get,
    path = "/api/v1/units/{unit_id}/group_sets",
    params(("unit_id" = String, Path, description = "Unit identifier")),
    responses(
        (status = 200, description = "Group sets of the unit", body = [GroupSetResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unit not found", body = ErrorSchema)
    ),
    tags = ["group_sets"],
    operation_id = "listGroupSets"
)]
#[get("/units/{unit_id}/group_sets")]
pub async fn list_group_sets(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<UnitPathParams>,
) -> ApiResult<web::Json<Vec<GroupSetResponse>>> {
    let actor = session.require_user_id()?;
    let unit_id = parse_unit_id(&path)?;
    let group_sets = state
        .group_sets_query
        .list_group_sets(ListGroupSetsRequest { actor, unit_id })
        .await?;
    Ok(web::Json(
        group_sets.into_iter().map(GroupSetResponse::from).collect(),
    ))
}

/// Create a group set in a unit. Convenors only.
#[utoipa::path(
    post,
    path = "/api/v1/units/{unit_id}/group_sets",
    params(("unit_id" = String, Path, description = "Unit identifier")),
    request_body = CreateGroupSetBody,
    responses(
        (status = 201, description = "Group set created", body = GroupSetResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unit not found", body = ErrorSchema),
        (status = 409, description = "Duplicate name", body = ErrorSchema)
    ),
    tags = ["group_sets"],
    operation_id = "createGroupSet"
)]
#[post("/units/{unit_id}/group_sets")]
pub async fn create_group_set(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<UnitPathParams>,
    payload: web::Json<CreateGroupSetBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let unit_id = parse_unit_id(&path)?;
    let group_set = state
        .group_sets
        .create_group_set(CreateGroupSetRequest {
            actor,
            unit_id,
            group_set: payload.into_inner().group_set.into(),
        })
        .await?;
    Ok(HttpResponse::Created().json(GroupSetResponse::from(group_set)))
}

/// Update a group set's name, flags or capacity. Convenors only.
#[utoipa::path(
    put,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier")
    ),
    request_body = UpdateGroupSetBody,
    responses(
        (status = 200, description = "Updated group set", body = GroupSetResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Duplicate name", body = ErrorSchema)
    ),
    tags = ["group_sets"],
    operation_id = "updateGroupSet"
)]
#[put("/units/{unit_id}/group_sets/{group_set_id}")]
pub async fn update_group_set(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<GroupSetPathParams>,
    payload: web::Json<UpdateGroupSetBody>,
) -> ApiResult<web::Json<GroupSetResponse>> {
    let actor = session.require_user_id()?;
    let (unit_id, group_set_id) = parse_group_set_path(&path)?;
    let group_set = state
        .group_sets
        .update_group_set(UpdateGroupSetRequest {
            actor,
            unit_id,
            group_set_id,
            changes: payload.into_inner().group_set.into(),
        })
        .await?;
    Ok(web::Json(group_set.into()))
}

/// Delete a group set together with its groups. Convenors only.
#[utoipa::path(
    delete,
    path = "/api/v1/units/{unit_id}/group_sets/{group_set_id}",
    params(
        ("unit_id" = String, Path, description = "Unit identifier"),
        ("group_set_id" = String, Path, description = "Group set identifier")
    ),
    responses(
        (status = 204, description = "Group set deleted"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["group_sets"],
    operation_id = "deleteGroupSet"
)]
#[delete("/units/{unit_id}/group_sets/{group_set_id}")]
pub async fn delete_group_set(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<GroupSetPathParams>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let (unit_id, group_set_id) = parse_group_set_path(&path)?;
    state
        .group_sets
        .delete_group_set(DeleteGroupSetRequest {
            actor,
            unit_id,
            group_set_id,
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "group_sets_tests.rs"]
mod tests;
