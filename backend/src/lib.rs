//! Unit group sets and groups backend.
//!
//! Hexagonal layout: [`domain`] holds entities, authorization rules and
//! services; [`inbound`] adapts HTTP onto the driving ports; [`outbound`]
//! implements the repository ports over PostgreSQL or process memory.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
