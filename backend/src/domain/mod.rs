//! Domain primitives, authorization rules and services for unit group sets.
//!
//! Purpose: define the entities (units, group sets, groups), the pure
//! authorization rules that gate every mutation, and the services that
//! implement the driving ports. Nothing here depends on actix or Diesel.
//!
//! Public surface:
//! - Error / ErrorCode: error payload and stable identifiers.
//! - Actor / UnitRole plus the `can_*` rules in [`authorization`].
//! - GroupSet, Group and their validated inputs.
//! - GroupSetService, GroupService, PasswordLoginService, DemoRosterSeeder.

pub mod auth;
pub mod authorization;
pub mod demo_roster;
pub mod error;
pub mod group;
pub mod group_service;
pub mod group_set;
pub mod group_set_service;
pub mod ids;
pub mod login_service;
pub mod membership;
pub mod ports;
pub mod trace_id;
pub mod unit;
mod unit_access;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::auth::{LoginCredentials, LoginValidationError, PasswordDigest};
pub use self::authorization::{Actor, GroupAction, UnitRole};
pub use self::demo_roster::{DemoRosterError, DemoRosterSeeder};
pub use self::error::{Error, ErrorCode};
pub use self::group::{
    Group, GroupDraft, GroupName, GroupParts, GroupSummary, GroupValidationError, LockState,
    LockTransition, NewGroup,
};
pub use self::group_service::GroupService;
pub use self::group_set::{
    GroupCapacity, GroupSet, GroupSetChanges, GroupSetName, GroupSetPolicy,
    GroupSetValidationError, NAME_MAX, NewGroupSet,
};
pub use self::group_set_service::GroupSetService;
pub use self::ids::{GroupId, GroupSetId, IdParseError, ProjectId, TutorialId, UnitId, UserId};
pub use self::login_service::PasswordLoginService;
pub use self::membership::MembershipError;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::unit::{
    Project, StaffAssignment, StaffRole, Tutorial, Unit, UnitDraft, UnitValidationError,
};
pub use self::user::{DisplayName, User, UserValidationError, Username};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use groups_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
