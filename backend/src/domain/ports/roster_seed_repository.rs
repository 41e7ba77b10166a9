//! Port abstraction for loading unit rosters in bulk.
//!
//! Units, tutorials and enrollments are owned by another system; this
//! service only receives them. Adapters apply a whole roster in a single
//! transaction.

use async_trait::async_trait;

use crate::domain::{Project, Tutorial, Unit};

use super::{UserAccount, define_port_error};

define_port_error! {
    /// Persistence errors raised by roster seed adapters.
    pub enum RosterSeedRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "roster seeding connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "roster seeding query failed: {message}",
    }
}

/// Outcome of applying a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedingResult {
    /// The roster was written.
    Applied,
    /// Every unit in the roster already existed; nothing was written.
    AlreadySeeded,
}

/// Accounts, units, tutorials and enrollments to load together.
#[derive(Debug, Clone, Default)]
pub struct RosterSeed {
    pub accounts: Vec<UserAccount>,
    pub units: Vec<Unit>,
    pub tutorials: Vec<Tutorial>,
    pub projects: Vec<Project>,
}

/// Port for applying a roster atomically.
///
/// Implementations must skip the whole roster when all of its units already
/// exist and roll back every write when any step fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterSeedRepository: Send + Sync {
    async fn seed_roster(&self, seed: RosterSeed)
    -> Result<SeedingResult, RosterSeedRepositoryError>;
}
