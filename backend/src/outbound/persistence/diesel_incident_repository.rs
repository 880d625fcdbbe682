//! PostgreSQL-backed `IncidentRepository` using Diesel.
//!
//! Inserts use `RETURNING` so the record handed back to the service, and
//! from there to the live feed, is the row as PostgreSQL stored it.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{IncidentPersistenceError, IncidentRepository};
use crate::domain::{ImageRef, Incident, IncidentId, IncidentType, UserId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::IncidentRow;
use super::pool::{DbPool, PoolError};
use super::schema::incidents;

/// Diesel-backed incident store.
#[derive(Clone)]
pub struct DieselIncidentRepository {
    pool: DbPool,
}

impl DieselIncidentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> IncidentPersistenceError {
    IncidentPersistenceError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> IncidentPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => IncidentPersistenceError::connection(message),
        DieselFailure::Query(message) => IncidentPersistenceError::query(message),
        DieselFailure::UniqueViolation => {
            IncidentPersistenceError::query("incident identifier collision")
        }
        DieselFailure::ForeignKeyViolation => IncidentPersistenceError::unknown_creator(),
    }
}

fn incident_to_row(incident: &Incident) -> IncidentRow {
    IncidentRow {
        id: *incident.id.as_uuid(),
        user_id: incident.user_id.as_ref().map(|id| *id.as_uuid()),
        incident_type: incident.incident_type.as_str().to_owned(),
        title: incident.title.clone(),
        description: incident.description.clone(),
        location: incident.location.clone(),
        latitude: incident.latitude,
        longitude: incident.longitude,
        images: incident
            .images
            .iter()
            .map(|image| image.as_str().to_owned())
            .collect(),
        created_at: incident.created_at,
    }
}

fn row_to_incident(row: IncidentRow) -> Result<Incident, IncidentPersistenceError> {
    let incident_type = row.incident_type.parse::<IncidentType>().map_err(|err| {
        IncidentPersistenceError::query(format!("invalid incident type in database: {err}"))
    })?;
    let images = row
        .images
        .iter()
        .filter_map(|raw| {
            let image = ImageRef::parse(raw);
            if image.is_none() {
                warn!(incident_id = %row.id, image = raw.as_str(), "skipping malformed image reference");
            }
            image
        })
        .collect();

    Ok(Incident {
        id: IncidentId::from_uuid(row.id),
        incident_type,
        title: row.title,
        description: row.description,
        location: row.location,
        latitude: row.latitude,
        longitude: row.longitude,
        images,
        user_id: row.user_id.map(UserId::from_uuid),
        created_at: row.created_at,
    })
}

#[async_trait]
impl IncidentRepository for DieselIncidentRepository {
    async fn insert(&self, incident: &Incident) -> Result<Incident, IncidentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: IncidentRow = diesel::insert_into(incidents::table)
            .values(&incident_to_row(incident))
            .returning(IncidentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_incident(row)
    }

    async fn list_newest_first(&self) -> Result<Vec<Incident>, IncidentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<IncidentRow> = incidents::table
            .order((incidents::created_at.desc(), incidents::id.desc()))
            .select(IncidentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_incident).collect()
    }
}
