//! Live incident feed over server-sent events.
//!
//! ```text
//! GET /api/incidents/stream
//! retry: 1000
//!
//! data: {"id":"…","type":"Fire",…}
//!
//! : keepalive
//! ```
//!
//! The [`SubscriberRegistry`] is shared between the stream endpoint, which
//! adds one subscriber per connection, and the [`IncidentBroadcaster`],
//! which the ingestion service notifies after each successful insert.
//! Nothing is replayed: clients load `GET /api/incidents` first and then
//! tail the stream.

mod broadcaster;
mod reconnect;
mod registry;
mod stream;

pub use broadcaster::{BroadcastReport, IncidentBroadcaster};
pub use reconnect::ReconnectPolicy;
pub use registry::{
    DeliveryError, RegistryError, Subscriber, SubscriberId, SubscriberInbox, SubscriberRegistry,
};
pub use stream::{KEEPALIVE_FRAME, SubscriberStream, incident_frame, retry_frame};

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};
use tracing::info;

use crate::domain::Error;
use crate::domain::ports::IncidentNotifier;
use crate::inbound::http::ApiResult;

/// Tunables for live-feed connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveFeedSettings {
    /// Interval between keepalive comments on an idle stream.
    pub keepalive: Duration,
    /// Frames a subscriber may fall behind before it is evicted.
    pub subscriber_buffer: usize,
    /// Reconnect contract; its initial delay is sent as `retry:`.
    pub reconnect: ReconnectPolicy,
}

impl Default for LiveFeedSettings {
    fn default() -> Self {
        Self {
            keepalive: Duration::from_secs(20),
            subscriber_buffer: 64,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Shared live-feed state: the registry, its broadcaster and settings.
pub struct LiveFeed {
    registry: Arc<SubscriberRegistry>,
    broadcaster: Arc<IncidentBroadcaster>,
    settings: LiveFeedSettings,
}

impl LiveFeed {
    pub fn new(registry: Arc<SubscriberRegistry>, settings: LiveFeedSettings) -> Self {
        let broadcaster = Arc::new(IncidentBroadcaster::new(Arc::clone(&registry)));
        Self {
            registry,
            broadcaster,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Arc<IncidentBroadcaster> {
        &self.broadcaster
    }

    /// The broadcaster as the ingestion service's notifier port.
    pub fn notifier(&self) -> Arc<dyn IncidentNotifier> {
        self.broadcaster.clone()
    }

    pub fn settings(&self) -> &LiveFeedSettings {
        &self.settings
    }

    /// Register a new connection and return its response body.
    pub fn subscribe(&self) -> Result<SubscriberStream, RegistryError> {
        let (subscriber, inbox) = Subscriber::channel(self.settings.subscriber_buffer);
        let id = subscriber.id();
        self.registry.register(subscriber)?;
        info!(
            subscriber_id = %id,
            subscribers = self.registry.len(),
            "live feed subscriber connected"
        );
        Ok(SubscriberStream::new(
            inbox,
            Arc::clone(&self.registry),
            self.settings.keepalive,
            self.settings.reconnect.initial_delay(),
        ))
    }
}

/// Open the live incident stream.
#[utoipa::path(
    get,
    path = "/api/incidents/stream",
    responses(
        (status = 200, description = "Server-sent event stream of new incidents", content_type = "text/event-stream", body = String),
        (status = 503, description = "Live feed at capacity", body = crate::inbound::http::schemas::ErrorSchema)
    ),
    tags = ["incidents"],
    operation_id = "streamIncidents",
    security([])
)]
#[get("/incidents/stream")]
pub async fn incident_stream(feed: web::Data<LiveFeed>) -> ApiResult<HttpResponse> {
    let stream = feed
        .subscribe()
        .map_err(|err| Error::service_unavailable(err.to_string()))?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream))
}
