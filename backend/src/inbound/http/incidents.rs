//! Incident report handlers.
//!
//! ```text
//! GET  /api/incidents
//! POST /api/incidents {"type":"Fire","title":"Warehouse blaze","latitude":51.5}
//! POST /api/incidents  (multipart/form-data with up to five `images` parts)
//! ```
//!
//! Both create forms share validation and answer `201` with the stored
//! record, which is also pushed to live-feed subscribers.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Error, ImageUpload, Incident, IncidentDraft, IncidentFields, IncidentSubmission, IncidentType,
    IncidentValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::OptionalBearerUser;
use crate::inbound::http::incident_form::{is_multipart, read_incident_form};
use crate::inbound::http::state::HttpState;

/// Coordinate as sent by form-style clients: a number, or a numeric string
/// where the empty string means "not provided".
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum CoordinateInput {
    Number(f64),
    Text(String),
}

/// JSON body for `POST /api/incidents`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    /// One of `Accident`, `Fighting`, `Rioting`, `Fire`, `Other`.
    #[serde(rename = "type", default)]
    #[schema(example = "Fire")]
    pub incident_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<CoordinateInput>,
    #[serde(default)]
    pub longitude: Option<CoordinateInput>,
}

/// Parse a textual coordinate; blank input means absent.
pub(crate) fn parse_coordinate(field: &'static str, raw: &str) -> Result<Option<f64>, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<f64>().map(Some).map_err(|_| {
        Error::invalid_request(format!("{field} must be a number"))
            .with_details(json!({ "field": field, "code": "invalid_number" }))
    })
}

fn resolve_coordinate(
    field: &'static str,
    input: Option<CoordinateInput>,
) -> Result<Option<f64>, Error> {
    match input {
        None => Ok(None),
        Some(CoordinateInput::Number(value)) => Ok(Some(value)),
        Some(CoordinateInput::Text(raw)) => parse_coordinate(field, &raw),
    }
}

impl CreateIncidentRequest {
    fn into_fields(self) -> Result<IncidentFields, Error> {
        Ok(IncidentFields {
            incident_type: self.incident_type,
            title: self.title,
            description: self.description,
            location: self.location,
            latitude: resolve_coordinate("latitude", self.latitude)?,
            longitude: resolve_coordinate("longitude", self.longitude)?,
        })
    }
}

pub(crate) fn map_incident_validation_error(err: IncidentValidationError) -> Error {
    let details = match &err {
        IncidentValidationError::MissingType => json!({ "field": "type", "code": "missing_type" }),
        IncidentValidationError::UnknownType { .. } => json!({
            "field": "type",
            "code": "unknown_type",
            "allowed": IncidentType::ALL.map(IncidentType::as_str),
        }),
        IncidentValidationError::LatitudeOutOfRange { .. } => {
            json!({ "field": "latitude", "code": "out_of_range" })
        }
        IncidentValidationError::LongitudeOutOfRange { .. } => {
            json!({ "field": "longitude", "code": "out_of_range" })
        }
        IncidentValidationError::TextTooLong { field, max } => {
            json!({ "field": field, "code": "too_long", "max": max })
        }
        IncidentValidationError::TooManyImages { max } => {
            json!({ "field": "images", "code": "too_many_images", "max": max })
        }
        IncidentValidationError::EmptyImage => json!({ "field": "images", "code": "empty_image" }),
        IncidentValidationError::NotAnImage { .. } => {
            json!({ "field": "images", "code": "not_an_image" })
        }
    };
    Error::invalid_request(err.to_string()).with_details(details)
}

async fn submit(
    state: &HttpState,
    fields: IncidentFields,
    images: Vec<ImageUpload>,
    creator: OptionalBearerUser,
) -> ApiResult<HttpResponse> {
    let draft = IncidentDraft::try_from_fields(fields).map_err(map_incident_validation_error)?;
    let creator = creator.0.map(|claims| claims.user_id);
    let submission =
        IncidentSubmission::new(draft, images, creator).map_err(map_incident_validation_error)?;
    let incident = state.incidents.create(submission).await?;
    Ok(HttpResponse::Created().json(incident))
}

/// List every report, newest first.
#[utoipa::path(
    get,
    path = "/api/incidents",
    responses(
        (status = 200, description = "Incidents, newest first", body = [crate::inbound::http::schemas::IncidentSchema]),
        (status = 503, description = "Storage unavailable", body = crate::inbound::http::schemas::ErrorSchema)
    ),
    tags = ["incidents"],
    operation_id = "listIncidents",
    security([])
)]
#[get("/incidents")]
pub async fn list_incidents(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Incident>>> {
    state.incidents_query.list().await.map(web::Json)
}

/// Create a report from a JSON body.
///
/// The same path also accepts `multipart/form-data` with photos, served by
/// [`create_incident_multipart`]. A bearer token is optional; when present
/// and valid the report is attributed to its owner.
#[utoipa::path(
    post,
    path = "/api/incidents",
    request_body(content(
        (CreateIncidentRequest = "application/json"),
        (crate::inbound::http::schemas::IncidentFormSchema = "multipart/form-data")
    )),
    responses(
        (status = 201, description = "Incident created", body = crate::inbound::http::schemas::IncidentSchema),
        (status = 400, description = "Invalid request", body = crate::inbound::http::schemas::ErrorSchema),
        (status = 401, description = "Invalid bearer token", body = crate::inbound::http::schemas::ErrorSchema),
        (status = 503, description = "Storage unavailable", body = crate::inbound::http::schemas::ErrorSchema)
    ),
    tags = ["incidents"],
    operation_id = "createIncident",
    security([], ("BearerAuth" = []))
)]
#[post("/incidents")]
pub async fn create_incident(
    state: web::Data<HttpState>,
    creator: OptionalBearerUser,
    payload: web::Json<CreateIncidentRequest>,
) -> ApiResult<HttpResponse> {
    let fields = payload.into_inner().into_fields()?;
    submit(&state, fields, Vec::new(), creator).await
}

/// Create a report with photos from a `multipart/form-data` body.
///
/// Text parts use the JSON field names; each photo is an `images` part with
/// an `image/*` content type. Documented together with [`create_incident`].
#[post("/incidents", guard = "is_multipart")]
pub async fn create_incident_multipart(
    state: web::Data<HttpState>,
    creator: OptionalBearerUser,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let form = read_incident_form(payload, state.max_image_bytes).await?;
    submit(&state, form.fields, form.images, creator).await
}
