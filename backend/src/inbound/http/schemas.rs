//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the JSON shape of their corresponding domain
//! types but live in the inbound adapter layer where framework concerns belong.

#![expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The resource already exists.
    #[schema(rename = "conflict")]
    Conflict,
    /// A dependency such as the database is unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "incident type is required")]
    message: String,
    /// Correlation identifier, also sent as the `trace-id` header.
    #[schema(example = "6f1c2a7e-8d4b-4f0e-9a55-0c1d2e3f4a5b")]
    trace_id: Option<String>,
    /// Field-level context, e.g. `{"field":"type","code":"missing_type"}`.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::User`].
#[derive(ToSchema)]
#[schema(as = crate::domain::User)]
pub struct UserSchema {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: String,
    /// Normalised (trimmed, lower-cased) email address.
    #[schema(example = "ada@example.com")]
    email: String,
}

/// OpenAPI schema for [`crate::domain::AuthSession`].
#[derive(ToSchema)]
#[schema(as = crate::domain::AuthSession)]
pub struct AuthSessionSchema {
    /// HS256 bearer token for the `Authorization` header.
    token: String,
    user: UserSchema,
}

/// OpenAPI schema for [`crate::domain::IncidentType`].
#[derive(ToSchema)]
#[schema(as = crate::domain::IncidentType)]
pub enum IncidentTypeSchema {
    Accident,
    Fighting,
    Rioting,
    Fire,
    Other,
}

/// OpenAPI schema for [`crate::domain::Incident`].
///
/// Same shape for `GET /api/incidents` items and live-feed `data:` payloads.
#[derive(ToSchema)]
#[schema(as = crate::domain::Incident, rename_all = "camelCase")]
pub struct IncidentSchema {
    #[schema(example = "0f8fad5b-d9cb-469f-a165-70867728950e")]
    id: String,
    #[schema(rename = "type")]
    incident_type: IncidentTypeSchema,
    #[schema(example = "Warehouse blaze")]
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    #[schema(example = 51.5072)]
    latitude: Option<f64>,
    longitude: Option<f64>,
    /// Stored photos, each `/uploads/<file>`.
    images: Vec<String>,
    user_id: Option<String>,
    #[schema(example = "2024-05-01T12:00:00Z")]
    created_at: String,
}

/// Multipart form accepted by `POST /api/incidents`.
#[derive(ToSchema)]
pub struct IncidentFormSchema {
    #[schema(rename = "type")]
    incident_type: IncidentTypeSchema,
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    /// Up to five `image/*` files.
    #[schema(value_type = Vec<String>)]
    images: Vec<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[test]
    fn error_code_schema_lists_every_code() {
        let schema_json = schema_to_json::<ErrorCodeSchema>();
        // utoipa replaces :: with . in schema names
        assert_eq!(ErrorCodeSchema::name(), "crate.domain.ErrorCode");
        for code in [
            "invalid_request",
            "unauthorized",
            "forbidden",
            "not_found",
            "conflict",
            "service_unavailable",
            "internal_error",
        ] {
            assert!(schema_json.contains(code), "missing {code}");
        }
    }

    #[test]
    fn error_schema_uses_camel_case() {
        let schema_json = schema_to_json::<ErrorSchema>();
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
        assert!(schema_json.contains("traceId"));
        assert!(!schema_json.contains("trace_id"));
    }

    #[test]
    fn incident_schema_matches_wire_names() {
        let schema_json = schema_to_json::<IncidentSchema>();
        assert_eq!(IncidentSchema::name(), "crate.domain.Incident");
        for field in ["userId", "createdAt", "images"] {
            assert!(schema_json.contains(field), "missing {field}");
        }
        assert!(!schema_json.contains("incident_type"));
    }
}
