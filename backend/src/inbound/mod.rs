//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! REST handlers live under [`http`]; the live incident stream lives under
//! [`sse`]. [`configure`] mounts both on an Actix application.

pub mod http;
pub mod sse;

use actix_web::web;

use self::http::health::{live, ready};
use self::http::incidents::{create_incident, create_incident_multipart, list_incidents};
use self::http::uploads::get_upload;
use self::http::users::{current_user, login, register};
use self::sse::incident_stream;

/// Mount every route.
///
/// Expects `web::Data` for [`http::state::HttpState`],
/// [`sse::LiveFeed`] and [`http::health::HealthState`] to be registered on
/// the application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(http::json_config())
        .service(
            web::scope("/api")
                .service(incident_stream)
                // Guarded on the multipart content type; must precede the JSON route.
                .service(create_incident_multipart)
                .service(create_incident)
                .service(list_incidents)
                .service(current_user),
        )
        .service(web::scope("/auth").service(register).service(login))
        .service(get_upload)
        .service(ready)
        .service(live);
}
