//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories translate between Diesel rows (`models.rs`, `schema.rs`,
//! both private) and domain types; no business rules live here. Connections
//! come from a `bb8` pool through `diesel-async`, and every driver failure
//! is mapped onto the owning port's error type.
//!
//! # Examples
//!
//! ```no_run
//! # async fn wire() -> Result<(), citizens_backend::outbound::persistence::PoolError> {
//! use citizens_backend::outbound::persistence::{
//!     DbPool, DieselIncidentRepository, DieselUserRepository, PoolConfig,
//! };
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/citizens")).await?;
//! let users = DieselUserRepository::new(pool.clone());
//! let incidents = DieselIncidentRepository::new(pool);
//! # Ok(())
//! # }
//! ```

mod diesel_error_mapping;
mod diesel_incident_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_incident_repository::DieselIncidentRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
