//! Driving port for reporting incidents.

use async_trait::async_trait;

use crate::domain::{Error, Incident, IncidentSubmission};

/// Domain use-case port for incident ingestion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IncidentCommand: Send + Sync {
    /// Store photos, persist the report and announce it to live subscribers.
    ///
    /// Returns the persisted record, identical to what subscribers receive.
    async fn create(&self, submission: IncidentSubmission) -> Result<Incident, Error>;
}
