//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories translate between Diesel row structs (`models.rs`) and
//! domain types; no business rules live here. Connections come from a
//! `bb8` pool of `diesel-async` connections, and every database error is
//! mapped onto the owning port's error type.
//!
//! # Example
//!
//! ```ignore
//! use groups_backend::outbound::persistence::{DbPool, DieselGroupRepository, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/groups");
//! let pool = DbPool::new(config).await?;
//! let repo = DieselGroupRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_group_repository;
mod diesel_group_set_repository;
mod diesel_roster_seed_repository;
mod diesel_unit_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_group_repository::DieselGroupRepository;
pub use diesel_group_set_repository::DieselGroupSetRepository;
pub use diesel_roster_seed_repository::DieselRosterSeedRepository;
pub use diesel_unit_repository::DieselUnitRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
