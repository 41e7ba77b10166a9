//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint, the request and response DTOs,
//! the error wrappers from [`crate::inbound::http::schemas`] and the session
//! cookie security scheme. The document backs Swagger UI in debug builds and
//! is printed by the `openapi-dump` binary.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::group_sets::{
    CreateGroupSetBody, GroupSetPatch, GroupSetResponse, NewGroupSetPayload, UpdateGroupSetBody,
};
use crate::inbound::http::groups::{
    AddMemberBody, CreateGroupBody, GroupPatch, GroupResponse, MemberResponse, NewGroupPayload,
    UpdateGroupBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::LoginRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Unit groups API",
        description = "Group sets and groups within teaching units, gated by unit roles.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::group_sets::list_group_sets,
        crate::inbound::http::group_sets::create_group_set,
        crate::inbound::http::group_sets::update_group_set,
        crate::inbound::http::group_sets::delete_group_set,
        crate::inbound::http::groups::list_unit_groups,
        crate::inbound::http::groups::list_groups,
        crate::inbound::http::groups::create_group,
        crate::inbound::http::groups::get_group,
        crate::inbound::http::groups::update_group,
        crate::inbound::http::groups::delete_group,
        crate::inbound::http::groups::list_members,
        crate::inbound::http::groups::add_member,
        crate::inbound::http::groups::remove_member,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        NewGroupSetPayload,
        CreateGroupSetBody,
        GroupSetPatch,
        UpdateGroupSetBody,
        GroupSetResponse,
        NewGroupPayload,
        CreateGroupBody,
        GroupPatch,
        UpdateGroupBody,
        AddMemberBody,
        GroupResponse,
        MemberResponse,
    )),
    tags(
        (name = "users", description = "Session login"),
        (name = "group_sets", description = "Group sets within a unit"),
        (name = "groups", description = "Groups and their members"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
