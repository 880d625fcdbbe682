//! Incident ingestion and listing.
//!
//! Creation runs in a fixed order: resolve the creator, store photos,
//! persist the record, then announce the persisted record. A failure before
//! the announcement leaves no broadcast behind and removes photos stored for
//! the failed report.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    ImageStore, ImageStoreError, IncidentCommand, IncidentNotifier, IncidentPersistenceError,
    IncidentQuery, IncidentRepository, UserRepository,
};
use crate::domain::account_service::map_user_persistence_error;
use crate::domain::{Error, ImageRef, Incident, IncidentId, IncidentSubmission, UserId};

const UNKNOWN_CREATOR: &str = "account no longer exists";

fn map_persistence_error(error: IncidentPersistenceError) -> Error {
    match error {
        IncidentPersistenceError::Connection { message } => Error::service_unavailable(message),
        IncidentPersistenceError::Query { message } => Error::internal(message),
        IncidentPersistenceError::UnknownCreator => Error::unauthorized(UNKNOWN_CREATOR),
    }
}

fn map_image_error(error: ImageStoreError) -> Error {
    Error::internal(error.to_string())
}

/// Ingestion and query service over the incident ports.
#[derive(Clone)]
pub struct IncidentService {
    incidents: Arc<dyn IncidentRepository>,
    users: Arc<dyn UserRepository>,
    images: Arc<dyn ImageStore>,
    notifier: Arc<dyn IncidentNotifier>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl IncidentService {
    /// Create a service from its collaborators.
    pub fn new(
        incidents: Arc<dyn IncidentRepository>,
        users: Arc<dyn UserRepository>,
        images: Arc<dyn ImageStore>,
        notifier: Arc<dyn IncidentNotifier>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            incidents,
            users,
            images,
            notifier,
            clock,
        }
    }

    /// A token can outlive its account; such a creator is rejected.
    async fn ensure_creator_exists(&self, creator: &UserId) -> Result<(), Error> {
        match self.users.find_by_id(creator).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                warn!(user_id = %creator, "incident submitted for unknown account");
                Err(Error::unauthorized(UNKNOWN_CREATOR))
            }
            Err(error) => Err(map_user_persistence_error(error)),
        }
    }

    async fn discard_images(&self, images: &[ImageRef]) {
        for image in images {
            if let Err(error) = self.images.remove(image).await {
                warn!(%error, image = image.as_str(), "failed to remove orphaned image");
            }
        }
    }
}

#[async_trait]
impl IncidentCommand for IncidentService {
    async fn create(&self, submission: IncidentSubmission) -> Result<Incident, Error> {
        let (draft, uploads, creator) = submission.into_parts();
        if let Some(creator) = &creator {
            self.ensure_creator_exists(creator).await?;
        }

        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.images.store(upload).await {
                Ok(image) => stored.push(image),
                Err(error) => {
                    self.discard_images(&stored).await;
                    return Err(map_image_error(error));
                }
            }
        }

        let incident = Incident::from_draft(
            IncidentId::random(),
            draft,
            stored.clone(),
            creator,
            self.clock.utc(),
        );
        let persisted = match self.incidents.insert(&incident).await {
            Ok(persisted) => persisted,
            Err(error) => {
                self.discard_images(&stored).await;
                return Err(map_persistence_error(error));
            }
        };

        info!(
            incident_id = %persisted.id,
            incident_type = %persisted.incident_type,
            images = persisted.images.len(),
            "incident reported"
        );
        self.notifier.incident_created(&persisted);
        Ok(persisted)
    }
}

#[async_trait]
impl IncidentQuery for IncidentService {
    async fn list(&self) -> Result<Vec<Incident>, Error> {
        self.incidents
            .list_newest_first()
            .await
            .map_err(map_persistence_error)
    }
}

#[cfg(test)]
mod tests;
