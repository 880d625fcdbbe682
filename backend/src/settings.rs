//! Runtime configuration loaded via OrthoConfig.
//!
//! Every value can come from `CITIZENS_*` environment variables, a
//! configuration file or command-line flags. Absent values fall back to the
//! defaults below.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::inbound::http::state::DEFAULT_MAX_IMAGE_BYTES;
use crate::inbound::sse::{LiveFeedSettings, ReconnectPolicy};
use crate::outbound::security::{DEFAULT_TOKEN_TTL, JwtSettings};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_BCRYPT_COST: u32 = 10;
const DEFAULT_KEEPALIVE_SECS: u64 = 20;
const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Signing secret used by debug builds when none is configured.
pub const DEV_JWT_SECRET: &str = "citizens-dev-secret-change-me";

/// Configuration problems detected after loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value:?}: {message}")]
    InvalidBindAddr { value: String, message: String },
    #[error("CITIZENS_JWT_SECRET must be set")]
    MissingJwtSecret,
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CITIZENS")]
pub struct AppSettings {
    /// Listen address, `host:port`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; in-memory repositories are used when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: Option<String>,
    /// Bearer token lifetime in seconds.
    pub token_ttl_secs: Option<u64>,
    /// bcrypt work factor.
    pub bcrypt_cost: Option<u32>,
    /// Directory incident photos are written to.
    pub upload_dir: Option<PathBuf>,
    /// Largest accepted photo, in bytes.
    pub max_image_bytes: Option<usize>,
    /// Seconds between keepalive comments on idle live-feed streams.
    pub keepalive_secs: Option<u64>,
    /// Frames a live-feed subscriber may lag before eviction.
    pub subscriber_buffer: Option<usize>,
    /// Cap on concurrent live-feed subscribers; unlimited when absent.
    pub max_subscribers: Option<usize>,
    /// First reconnect delay advertised to clients, in milliseconds.
    pub reconnect_initial_ms: Option<u64>,
    /// Ceiling for the client reconnect delay, in milliseconds.
    pub reconnect_max_ms: Option<u64>,
    /// Reconnect attempts before clients fall back to polling.
    pub reconnect_max_retries: Option<u32>,
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse::<SocketAddr>()
            .map_err(|err| SettingsError::InvalidBindAddr {
                value: raw.to_owned(),
                message: err.to_string(),
            })
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST)
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_UPLOAD_DIR))
    }

    pub fn max_image_bytes(&self) -> Result<usize, SettingsError> {
        match self.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES) {
            0 => Err(SettingsError::Zero {
                field: "max_image_bytes",
            }),
            bytes => Ok(bytes),
        }
    }

    /// Live-feed subscriber cap; `None` means unlimited.
    pub fn max_subscribers(&self) -> Result<Option<usize>, SettingsError> {
        match self.max_subscribers {
            Some(0) => Err(SettingsError::Zero {
                field: "max_subscribers",
            }),
            limit => Ok(limit),
        }
    }

    /// The configured signing secret, ignoring blank values.
    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Token settings.
    ///
    /// Without a configured secret, [`DEV_JWT_SECRET`] is used when
    /// `allow_dev_secret` holds; otherwise loading fails.
    pub fn jwt(&self, allow_dev_secret: bool) -> Result<JwtSettings, SettingsError> {
        let secret = match self.jwt_secret() {
            Some(secret) => secret,
            None if allow_dev_secret => DEV_JWT_SECRET,
            None => return Err(SettingsError::MissingJwtSecret),
        };
        let ttl = self
            .token_ttl_secs
            .map_or(DEFAULT_TOKEN_TTL, Duration::from_secs);
        if ttl.is_zero() {
            return Err(SettingsError::Zero {
                field: "token_ttl_secs",
            });
        }
        Ok(JwtSettings::new(secret, ttl))
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let defaults = ReconnectPolicy::default();
        ReconnectPolicy::new(
            self.reconnect_initial_ms
                .map_or(defaults.initial_delay(), Duration::from_millis),
            self.reconnect_max_ms
                .map_or(defaults.max_delay(), Duration::from_millis),
            self.reconnect_max_retries
                .unwrap_or(defaults.max_retries()),
        )
    }

    pub fn live_feed(&self) -> Result<LiveFeedSettings, SettingsError> {
        let keepalive_secs = self.keepalive_secs.unwrap_or(DEFAULT_KEEPALIVE_SECS);
        if keepalive_secs == 0 {
            return Err(SettingsError::Zero {
                field: "keepalive_secs",
            });
        }
        let subscriber_buffer = self.subscriber_buffer.unwrap_or(DEFAULT_SUBSCRIBER_BUFFER);
        if subscriber_buffer == 0 {
            return Err(SettingsError::Zero {
                field: "subscriber_buffer",
            });
        }
        Ok(LiveFeedSettings {
            keepalive: Duration::from_secs(keepalive_secs),
            subscriber_buffer,
            reconnect: self.reconnect_policy(),
        })
    }
}
