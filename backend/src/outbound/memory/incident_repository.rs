//! `IncidentRepository` over a mutex-guarded vector in insertion order.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::Incident;
use crate::domain::ports::{IncidentPersistenceError, IncidentRepository};

/// Incidents held in memory.
#[derive(Default)]
pub struct InMemoryIncidentRepository {
    incidents: Mutex<Vec<Incident>>,
}

impl InMemoryIncidentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> IncidentPersistenceError {
    IncidentPersistenceError::query("incident store lock poisoned")
}

#[async_trait]
impl IncidentRepository for InMemoryIncidentRepository {
    async fn insert(&self, incident: &Incident) -> Result<Incident, IncidentPersistenceError> {
        let mut incidents = self.incidents.lock().map_err(poisoned)?;
        if incidents.iter().any(|stored| stored.id == incident.id) {
            return Err(IncidentPersistenceError::query("incident identifier collision"));
        }
        incidents.push(incident.clone());
        Ok(incident.clone())
    }

    /// Newest `created_at` first; ties go to the later insert.
    async fn list_newest_first(&self) -> Result<Vec<Incident>, IncidentPersistenceError> {
        let incidents = self.incidents.lock().map_err(poisoned)?;
        let mut listed: Vec<Incident> = incidents.iter().rev().cloned().collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }
}
