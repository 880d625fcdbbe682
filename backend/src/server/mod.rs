//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::ServerConfig;
#[cfg(feature = "metrics")]
pub use metrics::initialize_metrics;
pub use state_builders::{AppState, build_app_state};

#[cfg(feature = "metrics")]
use metrics::RequestMetrics;

use std::net::SocketAddr;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::ApiDoc;
use crate::Trace;
use crate::inbound;
use crate::inbound::http::health::HealthState;

/// Build one worker's application over the shared state.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppState {
        health,
        http,
        live_feed,
    } = state;

    let app = App::new()
        .app_data(health)
        .app_data(http)
        .app_data(live_feed)
        .wrap(Trace)
        .configure(inbound::configure);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// A bound, not yet awaited, server.
pub struct BoundServer {
    pub server: Server,
    /// Addresses actually bound; differs from the configured one for port 0.
    pub addrs: Vec<SocketAddr>,
}

/// Construct an Actix HTTP server from the configuration.
///
/// `health_state` is marked ready once the listener is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when building the state, binding the socket
/// or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<BoundServer> {
    let state = build_app_state(&config, health_state.clone())?;

    #[cfg(feature = "metrics")]
    let request_metrics = RequestMetrics::new(config.prometheus);

    let http_server = HttpServer::new(move || {
        let app = build_app(state.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(request_metrics.clone());

        app
    })
    .bind(config.bind_addr)?;

    let addrs = http_server.addrs();
    // Streams stay open until the client leaves; don't hold shutdown for them.
    let server = http_server.shutdown_timeout(5).run();

    info!(addrs = ?addrs, "listening");
    health_state.mark_ready();
    Ok(BoundServer { server, addrs })
}
