//! Port abstraction for incident persistence.
use async_trait::async_trait;

use crate::domain::Incident;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by incident repository adapters.
    pub enum IncidentPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "incident repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "incident repository query failed: {message}",
        /// The referenced creator account does not exist.
        UnknownCreator => "incident creator does not exist",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IncidentRepository: Send + Sync {
    /// Persist a new incident and return the stored record.
    ///
    /// The returned value is what gets broadcast, so adapters must return the
    /// row as the store holds it rather than echoing the argument.
    async fn insert(&self, incident: &Incident) -> Result<Incident, IncidentPersistenceError>;

    /// All incidents, most recent `created_at` first.
    async fn list_newest_first(&self) -> Result<Vec<Incident>, IncidentPersistenceError>;
}
