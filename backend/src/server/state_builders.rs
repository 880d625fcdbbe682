//! Builders wiring outbound adapters into the shared application state.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use crate::domain::ports::{IncidentRepository, UserRepository};
use crate::domain::{AccountService, IncidentService};
use crate::inbound::http::health::HealthState;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::sse::{LiveFeed, SubscriberRegistry};
use crate::outbound::memory::{InMemoryIncidentRepository, InMemoryUserRepository};
use crate::outbound::persistence::{DbPool, DieselIncidentRepository, DieselUserRepository};
use crate::outbound::security::{BcryptPasswordHasher, JwtTokenService};
use crate::outbound::storage::CapStdImageStore;

use super::ServerConfig;

/// Everything registered as `web::Data` on each worker's `App`.
///
/// Built once per server; clones share the same registry and services.
#[derive(Clone)]
pub struct AppState {
    pub health: web::Data<HealthState>,
    pub http: web::Data<HttpState>,
    pub live_feed: web::Data<LiveFeed>,
}

fn build_repositories(
    pool: Option<&DbPool>,
) -> (Arc<dyn UserRepository>, Arc<dyn IncidentRepository>) {
    match pool {
        Some(pool) => (
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselIncidentRepository::new(pool.clone())),
        ),
        None => {
            info!("no database configured; using in-memory repositories");
            (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryIncidentRepository::new()),
            )
        }
    }
}

fn build_live_feed(config: &ServerConfig) -> LiveFeed {
    let registry = match config.max_subscribers {
        Some(limit) => SubscriberRegistry::with_capacity_limit(limit),
        None => SubscriberRegistry::new(),
    };
    LiveFeed::new(Arc::new(registry), config.live_feed)
}

/// Build the shared state: repositories, credential adapters, the image
/// store and the live feed whose broadcaster the incident service notifies.
///
/// # Errors
///
/// Fails when the upload directory cannot be opened or the bcrypt cost is
/// out of range.
pub fn build_app_state(
    config: &ServerConfig,
    health: web::Data<HealthState>,
) -> io::Result<AppState> {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(DefaultClock);
    let (users, incidents) = build_repositories(config.db_pool.as_ref());

    let hasher = BcryptPasswordHasher::new(config.bcrypt_cost).map_err(io::Error::other)?;
    let tokens = Arc::new(JwtTokenService::new(&config.jwt, Arc::clone(&clock)));
    let images = Arc::new(CapStdImageStore::open(&config.upload_dir)?);
    let live_feed = build_live_feed(config);

    let accounts = Arc::new(AccountService::new(
        Arc::clone(&users),
        Arc::new(hasher),
        tokens.clone(),
    ));
    let incident_service = Arc::new(IncidentService::new(
        incidents,
        users,
        images.clone(),
        live_feed.notifier(),
        clock,
    ));

    let http = HttpState::new(
        HttpStatePorts {
            registration: accounts.clone(),
            login: accounts.clone(),
            users: accounts,
            tokens,
            incidents: incident_service.clone(),
            incidents_query: incident_service,
            images,
        },
        config.max_image_bytes,
    );

    Ok(AppState {
        health,
        http: web::Data::new(http),
        live_feed: web::Data::new(live_feed),
    })
}
