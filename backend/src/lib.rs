//! Citizen incident-reporting backend.
//!
//! Hexagonal layout: [`domain`] holds the types, services and ports;
//! [`inbound`] adapts HTTP and the live incident stream onto the driving
//! ports; [`outbound`] implements the driven ports over PostgreSQL, memory,
//! bcrypt, JWT and the filesystem. [`server`] wires them together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::trace::Trace;
