//! OpenAPI documentation for the HTTP surface.
//!
//! [`ApiDoc`] registers every route from the inbound layer, the schema
//! wrappers from [`crate::inbound::http::schemas`] and the bearer security
//! scheme. Swagger UI serves it at `/docs` in debug builds, and
//! `cargo run --bin openapi-dump` prints it for external tooling.

use crate::inbound::http::schemas::{
    AuthSessionSchema, ErrorCodeSchema, ErrorSchema, IncidentFormSchema, IncidentSchema,
    IncidentTypeSchema, UserSchema,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `BearerAuth` scheme used by protected routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token returned by POST /auth/register or POST /auth/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API and live feed.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Citizens incident API",
        description = "Account management, incident reporting and the live incident feed."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::current_user,
        crate::inbound::http::incidents::list_incidents,
        crate::inbound::http::incidents::create_incident,
        crate::inbound::sse::incident_stream,
        crate::inbound::http::uploads::get_upload,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        AuthSessionSchema,
        ErrorCodeSchema,
        ErrorSchema,
        IncidentFormSchema,
        IncidentSchema,
        IncidentTypeSchema,
        UserSchema
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "The signed-in account"),
        (name = "incidents", description = "Incident reports and the live feed"),
        (name = "uploads", description = "Stored incident photos"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
