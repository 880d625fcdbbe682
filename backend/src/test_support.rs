//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and behind the `test-support` feature.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::web;
use tempfile::TempDir;

use crate::inbound::http::health::HealthState;
use crate::inbound::sse::LiveFeedSettings;
use crate::outbound::security::{DEFAULT_TOKEN_TTL, JwtSettings};
use crate::server::{ServerConfig, create_server};

/// Signing secret used by spawned test servers.
pub const TEST_JWT_SECRET: &str = "citizens-test-secret";

/// Lowest bcrypt cost the hasher accepts; keeps registration fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Options for [`TestServer::spawn_with`].
#[derive(Debug, Clone, Default)]
pub struct TestServerOptions {
    pub live_feed: LiveFeedSettings,
    pub max_subscribers: Option<usize>,
    pub max_image_bytes: Option<usize>,
}

impl TestServerOptions {
    #[must_use]
    pub fn with_keepalive(mut self, keepalive: Duration) -> Self {
        self.live_feed.keepalive = keepalive;
        self
    }

    #[must_use]
    pub fn with_max_subscribers(mut self, limit: usize) -> Self {
        self.max_subscribers = Some(limit);
        self
    }

    #[must_use]
    pub fn with_max_image_bytes(mut self, limit: usize) -> Self {
        self.max_image_bytes = Some(limit);
        self
    }
}

/// A real server on an ephemeral loopback port, backed by in-memory
/// repositories and a temporary upload directory.
///
/// Must be spawned from inside an Actix system (`#[actix_rt::test]`).
pub struct TestServer {
    addr: SocketAddr,
    handle: ServerHandle,
    health: web::Data<HealthState>,
    upload_dir: TempDir,
}

impl TestServer {
    /// Spawn with default options.
    pub fn spawn() -> io::Result<Self> {
        Self::spawn_with(TestServerOptions::default())
    }

    /// Spawn with explicit options.
    pub fn spawn_with(options: TestServerOptions) -> io::Result<Self> {
        let upload_dir = tempfile::tempdir()?;
        let bind_addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let mut config = ServerConfig::new(
            bind_addr,
            JwtSettings::new(TEST_JWT_SECRET, DEFAULT_TOKEN_TTL),
            upload_dir.path(),
        )
        .with_bcrypt_cost(TEST_BCRYPT_COST)
        .with_live_feed(options.live_feed)
        .with_max_subscribers(options.max_subscribers);
        if let Some(limit) = options.max_image_bytes {
            config = config.with_max_image_bytes(limit);
        }

        let health = web::Data::new(HealthState::new());
        let bound = create_server(health.clone(), config)?;
        let addr = bound
            .addrs
            .first()
            .copied()
            .ok_or_else(|| io::Error::other("server bound no addresses"))?;
        let handle = bound.server.handle();
        actix_web::rt::spawn(bound.server);

        Ok(Self {
            addr,
            handle,
            health,
            upload_dir,
        })
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn health(&self) -> &web::Data<HealthState> {
        &self.health
    }

    /// Directory photos are written to.
    pub fn upload_dir(&self) -> &std::path::Path {
        self.upload_dir.path()
    }

    /// Stop accepting connections and wait for workers to exit.
    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}
