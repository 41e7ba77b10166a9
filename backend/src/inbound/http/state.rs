//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    GroupCommand, GroupQuery, GroupRepository, GroupSetCommand, GroupSetQuery,
    GroupSetRepository, LoginService, UnitRepository, UserRepository,
};
use crate::domain::{GroupService, GroupSetService, PasswordLoginService};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub group_sets: Arc<dyn GroupSetCommand>,
    pub group_sets_query: Arc<dyn GroupSetQuery>,
    pub groups: Arc<dyn GroupCommand>,
    pub groups_query: Arc<dyn GroupQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub group_sets: Arc<dyn GroupSetCommand>,
    pub group_sets_query: Arc<dyn GroupSetQuery>,
    pub groups: Arc<dyn GroupCommand>,
    pub groups_query: Arc<dyn GroupQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            group_sets,
            group_sets_query,
            groups,
            groups_query,
        } = ports;
        Self {
            login,
            group_sets,
            group_sets_query,
            groups,
            groups_query,
        }
    }

    /// Wire the domain services over one set of repository adapters.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use groups_backend::inbound::http::state::HttpState;
    /// use groups_backend::outbound::memory::InMemoryStore;
    ///
    /// let store = Arc::new(InMemoryStore::new());
    /// let state = HttpState::from_repositories(
    ///     store.clone(),
    ///     store.clone(),
    ///     store.clone(),
    ///     store,
    /// );
    /// let _groups = state.groups.clone();
    /// ```
    pub fn from_repositories<U, S, G, R>(
        units: Arc<U>,
        group_sets: Arc<S>,
        groups: Arc<G>,
        users: Arc<R>,
    ) -> Self
    where
        U: UnitRepository + 'static,
        S: GroupSetRepository + 'static,
        G: GroupRepository + 'static,
        R: UserRepository + 'static,
    {
        let group_set_service = Arc::new(GroupSetService::new(units.clone(), group_sets.clone()));
        let group_service = Arc::new(GroupService::new(units, group_sets, groups));
        Self::new(HttpStatePorts {
            login: Arc::new(PasswordLoginService::new(users)),
            group_sets: group_set_service.clone(),
            group_sets_query: group_set_service,
            groups: group_service.clone(),
            groups_query: group_service,
        })
    }
}
