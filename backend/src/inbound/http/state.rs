//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ImageStore, IncidentCommand, IncidentQuery, LoginService, RegistrationService, TokenService,
    UsersQuery,
};

/// Default per-file limit for uploaded photos (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub registration: Arc<dyn RegistrationService>,
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UsersQuery>,
    pub tokens: Arc<dyn TokenService>,
    pub incidents: Arc<dyn IncidentCommand>,
    pub incidents_query: Arc<dyn IncidentQuery>,
    pub images: Arc<dyn ImageStore>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub registration: Arc<dyn RegistrationService>,
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UsersQuery>,
    pub tokens: Arc<dyn TokenService>,
    pub incidents: Arc<dyn IncidentCommand>,
    pub incidents_query: Arc<dyn IncidentQuery>,
    pub images: Arc<dyn ImageStore>,
    /// Largest accepted photo, in bytes.
    pub max_image_bytes: usize,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports, DEFAULT_MAX_IMAGE_BYTES)
    }
}

impl HttpState {
    /// Construct state from a ports bundle and the upload size limit.
    pub fn new(ports: HttpStatePorts, max_image_bytes: usize) -> Self {
        let HttpStatePorts {
            registration,
            login,
            users,
            tokens,
            incidents,
            incidents_query,
            images,
        } = ports;
        Self {
            registration,
            login,
            users,
            tokens,
            incidents,
            incidents_query,
            images,
            max_image_bytes,
        }
    }
}
