//! Request metrics behind the `metrics` feature.
//!
//! [`RequestMetrics`] wraps an optional Prometheus exporter so the worker
//! factory builds one application type whether or not the exporter came up.

use std::sync::Arc;

use actix_service::boxed::{self, BoxService};
use actix_service::{Service, ServiceExt as _, Transform};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use futures_util::future::LocalBoxFuture;
use tracing::{info, warn};

const NAMESPACE: &str = "citizens";
const ENDPOINT: &str = "/metrics";

/// Build the exporter served at `/metrics`.
///
/// Returns `None` and logs a warning when registration fails; the server
/// then runs without request metrics.
pub fn initialize_metrics() -> Option<PrometheusMetrics> {
    let built = PrometheusMetricsBuilder::new(NAMESPACE)
        .endpoint(ENDPOINT)
        .build();
    match built {
        Ok(metrics) => {
            info!(endpoint = ENDPOINT, "request metrics enabled");
            Some(metrics)
        }
        Err(error) => {
            warn!(%error, "request metrics unavailable");
            None
        }
    }
}

type BoxedApp = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;

/// Prometheus middleware, or a pass-through when no exporter is configured.
#[derive(Clone, Default)]
pub(crate) struct RequestMetrics(Option<Arc<PrometheusMetrics>>);

impl RequestMetrics {
    pub(crate) fn new(exporter: Option<PrometheusMetrics>) -> Self {
        Self(exporter.map(Arc::new))
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxedApp;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let Some(exporter) = self.0.clone() else {
            let passthrough = service.map(ServiceResponse::map_into_boxed_body);
            return Box::pin(async move { Ok(boxed::service(passthrough)) });
        };
        let wrapped = Compat::new(PrometheusMetrics::clone(&exporter)).new_transform(service);
        Box::pin(async move { Ok(boxed::service(wrapped.await?)) })
    }
}
