//! Wiring of repository adapters into HTTP state.

use std::sync::Arc;

use groups_backend::domain::ports::SeedingResult;
use groups_backend::domain::{DemoRosterError, DemoRosterSeeder};
use groups_backend::inbound::http::state::HttpState;
use groups_backend::outbound::memory::InMemoryStore;
use groups_backend::outbound::persistence::{
    DbPool, DieselGroupRepository, DieselGroupSetRepository, DieselRosterSeedRepository,
    DieselUnitRepository, DieselUserRepository,
};

/// Where repository ports are backed.
#[derive(Clone)]
pub(crate) enum Persistence {
    Postgres(DbPool),
    Memory(Arc<InMemoryStore>),
}

impl Persistence {
    pub(crate) fn from_pool(pool: Option<DbPool>) -> Self {
        match pool {
            Some(pool) => Self::Postgres(pool),
            None => Self::Memory(Arc::new(InMemoryStore::new())),
        }
    }

    pub(crate) fn http_state(&self) -> HttpState {
        match self {
            Self::Postgres(pool) => HttpState::from_repositories(
                Arc::new(DieselUnitRepository::new(pool.clone())),
                Arc::new(DieselGroupSetRepository::new(pool.clone())),
                Arc::new(DieselGroupRepository::new(pool.clone())),
                Arc::new(DieselUserRepository::new(pool.clone())),
            ),
            Self::Memory(store) => HttpState::from_repositories(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            ),
        }
    }

    /// Seed the demo roster into whichever store backs the server.
    pub(crate) async fn seed_demo_roster(
        &self,
        password: &str,
    ) -> Result<SeedingResult, DemoRosterError> {
        match self {
            Self::Postgres(pool) => {
                DemoRosterSeeder::new(Arc::new(DieselRosterSeedRepository::new(pool.clone())))
                    .seed(password)
                    .await
            }
            Self::Memory(store) => DemoRosterSeeder::new(store.clone()).seed(password).await,
        }
    }
}
