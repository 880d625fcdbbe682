//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

use crate::inbound::http::state::DEFAULT_MAX_IMAGE_BYTES;
use crate::inbound::sse::LiveFeedSettings;
use crate::outbound::persistence::DbPool;
use crate::outbound::security::JwtSettings;
use crate::settings::{AppSettings, SettingsError};

const DEFAULT_BCRYPT_COST: u32 = 10;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) jwt: JwtSettings,
    pub(crate) bcrypt_cost: u32,
    pub(crate) upload_dir: PathBuf,
    pub(crate) max_image_bytes: usize,
    pub(crate) live_feed: LiveFeedSettings,
    pub(crate) max_subscribers: Option<usize>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Configuration with in-memory persistence and default limits.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, jwt: JwtSettings, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            jwt,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            upload_dir: upload_dir.into(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            live_feed: LiveFeedSettings::default(),
            max_subscribers: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Resolve every value from loaded settings.
    ///
    /// `allow_dev_secret` permits the built-in signing secret when none is
    /// configured; release binaries pass `false`.
    ///
    /// # Errors
    ///
    /// Any [`SettingsError`] raised while resolving the values.
    pub fn from_settings(
        settings: &AppSettings,
        allow_dev_secret: bool,
    ) -> Result<Self, SettingsError> {
        let config = Self::new(
            settings.bind_addr()?,
            settings.jwt(allow_dev_secret)?,
            settings.upload_dir(),
        )
        .with_bcrypt_cost(settings.bcrypt_cost())
        .with_max_image_bytes(settings.max_image_bytes()?)
        .with_live_feed(settings.live_feed()?)
        .with_max_subscribers(settings.max_subscribers()?);
        Ok(config)
    }

    /// Attach a database pool; without one, in-memory repositories are used.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    #[must_use]
    pub fn with_live_feed(mut self, live_feed: LiveFeedSettings) -> Self {
        self.live_feed = live_feed;
        self
    }

    /// Cap concurrent live-feed subscribers; `None` leaves them unbounded.
    #[must_use]
    pub fn with_max_subscribers(mut self, max_subscribers: Option<usize>) -> Self {
        self.max_subscribers = max_subscribers;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }

    #[cfg(feature = "metrics")]
    /// Return the configured Prometheus middleware, if any.
    #[must_use]
    pub fn metrics(&self) -> Option<&PrometheusMetrics> {
        self.prometheus.as_ref()
    }
}
