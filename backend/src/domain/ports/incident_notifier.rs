//! Driven port through which ingestion announces new incidents.
//!
//! Delivery is fire-and-forget: the notifier never reports failures back to
//! the creator of the incident.

use crate::domain::Incident;

#[cfg_attr(test, mockall::automock)]
pub trait IncidentNotifier: Send + Sync {
    /// Announce a freshly persisted incident.
    fn incident_created(&self, incident: &Incident);
}

/// Notifier that drops every announcement.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpIncidentNotifier;

impl IncidentNotifier for NoOpIncidentNotifier {
    fn incident_created(&self, _incident: &Incident) {}
}
