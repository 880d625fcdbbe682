//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod incident_form;
pub mod incidents;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod uploads;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

use crate::domain::Error;

/// JSON extractor settings: malformed bodies answer with the standard error
/// payload instead of Actix's plain-text rejection.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            Error::invalid_request(format!("invalid JSON body: {err}")).into()
        })
}
