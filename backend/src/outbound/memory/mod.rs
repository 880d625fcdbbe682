//! In-process adapters used when no database is configured.
//!
//! State lives for the lifetime of the process; nothing is persisted. The
//! adapters honour the same contracts as the Diesel repositories so the
//! server and the integration tests can run without PostgreSQL.

mod incident_repository;
mod user_repository;

pub use incident_repository::InMemoryIncidentRepository;
pub use user_repository::InMemoryUserRepository;
