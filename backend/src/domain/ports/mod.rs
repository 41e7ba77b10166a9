//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod group_command;
mod group_query;
mod group_repository;
mod group_set_command;
mod group_set_query;
mod group_set_repository;
mod login_service;
mod roster_seed_repository;
mod unit_repository;
mod user_repository;

#[cfg(test)]
pub use group_command::MockGroupCommand;
pub use group_command::{
    CreateGroupRequest, DeleteGroupRequest, GroupCommand, GroupInput, GroupPath, GroupSetPath,
    GroupUpdate, MemberRequest, UpdateGroupRequest,
};
#[cfg(test)]
pub use group_query::MockGroupQuery;
pub use group_query::{GetGroupRequest, GroupQuery, ListGroupsRequest, ListUnitGroupsRequest};
#[cfg(test)]
pub use group_repository::MockGroupRepository;
pub use group_repository::{GroupRepository, GroupRepositoryError};
#[cfg(test)]
pub use group_set_command::MockGroupSetCommand;
pub use group_set_command::{
    CreateGroupSetRequest, DeleteGroupSetRequest, GroupSetCommand, GroupSetInput, GroupSetUpdate,
    UpdateGroupSetRequest,
};
#[cfg(test)]
pub use group_set_query::MockGroupSetQuery;
pub use group_set_query::{GroupSetQuery, ListGroupSetsRequest};
#[cfg(test)]
pub use group_set_repository::MockGroupSetRepository;
pub use group_set_repository::{GroupSetRepository, GroupSetRepositoryError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use roster_seed_repository::MockRosterSeedRepository;
pub use roster_seed_repository::{
    RosterSeed, RosterSeedRepository, RosterSeedRepositoryError, SeedingResult,
};
#[cfg(test)]
pub use unit_repository::MockUnitRepository;
pub use unit_repository::{UnitRepository, UnitRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserAccount, UserPersistenceError, UserRepository};
