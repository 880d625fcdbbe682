//! Driving port for reading the incident feed.

use async_trait::async_trait;

use crate::domain::{Error, Incident};

/// Domain use-case port for listing incidents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IncidentQuery: Send + Sync {
    /// All incidents, newest first.
    async fn list(&self) -> Result<Vec<Incident>, Error>;
}
