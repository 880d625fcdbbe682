//! Incident reports: the record broadcast to live subscribers and the
//! validated draft it is built from.
//!
//! An [`Incident`] is immutable once persisted. The JSON shape (camelCase,
//! `type` for the category) is shared by `GET /api/incidents` and the live
//! stream so clients can merge both sources without translation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Maximum number of photos attached to a single report.
pub const MAX_IMAGES: usize = 5;
/// Public path prefix under which stored images are served.
pub const UPLOADS_PREFIX: &str = "/uploads/";

const TITLE_MAX: usize = 200;
const LOCATION_MAX: usize = 500;
const DESCRIPTION_MAX: usize = 5_000;

/// Validation failures raised while building a report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IncidentValidationError {
    #[error("incident type is required")]
    MissingType,
    #[error("unknown incident type: {value}")]
    UnknownType { value: String },
    #[error("latitude must be between -90 and 90")]
    LatitudeOutOfRange { value: f64 },
    #[error("longitude must be between -180 and 180")]
    LongitudeOutOfRange { value: f64 },
    #[error("{field} must be at most {max} characters")]
    TextTooLong { field: &'static str, max: usize },
    #[error("at most {max} images may be attached")]
    TooManyImages { max: usize },
    #[error("image uploads must not be empty")]
    EmptyImage,
    #[error("uploads must be images, got {content_type}")]
    NotAnImage { content_type: String },
}

/// Incident category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentType {
    Accident,
    Fighting,
    Rioting,
    Fire,
    Other,
}

impl IncidentType {
    /// Every category, in presentation order.
    pub const ALL: [Self; 5] = [
        Self::Accident,
        Self::Fighting,
        Self::Rioting,
        Self::Fire,
        Self::Other,
    ];

    /// Canonical spelling used on the wire and in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accident => "Accident",
            Self::Fighting => "Fighting",
            Self::Rioting => "Rioting",
            Self::Fire => "Fire",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentType {
    type Err = IncidentValidationError;

    /// Case-insensitive match on the canonical spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IncidentValidationError::MissingType);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| IncidentValidationError::UnknownType {
                value: trimmed.to_owned(),
            })
    }
}

/// Server-assigned incident identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(Uuid);

impl IncidentId {
    /// Generate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public reference to a stored image, always `/uploads/<file>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Reference for a file stored by the image store.
    pub fn for_file(file_name: &str) -> Self {
        Self(format!("{UPLOADS_PREFIX}{file_name}"))
    }

    /// Re-hydrate a reference read back from storage.
    ///
    /// Returns `None` when `raw` is not of the `/uploads/<file>` form.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.strip_prefix(UPLOADS_PREFIX)
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .map(Self::for_file)
    }

    /// File name relative to the upload directory.
    pub fn file_name(&self) -> &str {
        self.0.strip_prefix(UPLOADS_PREFIX).unwrap_or(self.0.as_str())
    }

    /// Full public path.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A photo received with a report, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    original_name: Option<String>,
    content_type: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Validate an uploaded file.
    ///
    /// The declared content type must be `image/*`; empty files are rejected.
    pub fn try_new(
        original_name: Option<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, IncidentValidationError> {
        let content_type = content_type.unwrap_or_default().trim().to_ascii_lowercase();
        if !content_type.starts_with("image/") {
            return Err(IncidentValidationError::NotAnImage {
                content_type: if content_type.is_empty() {
                    "unknown".to_owned()
                } else {
                    content_type
                },
            });
        }
        if bytes.is_empty() {
            return Err(IncidentValidationError::EmptyImage);
        }
        Ok(Self {
            original_name: original_name.filter(|name| !name.trim().is_empty()),
            content_type,
            bytes,
        })
    }

    /// Client-supplied file name, if any.
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    /// Lower-cased `image/*` media type.
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// Raw file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the upload, yielding its contents.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Unvalidated report fields as received from a client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentFields {
    pub incident_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Validated report content, ready to be stamped with an id and timestamp.
///
/// ## Invariants
/// - Free-text fields are trimmed; blank values become `None`.
/// - Coordinates, when present, are finite and within WGS84 bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentDraft {
    incident_type: IncidentType,
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl IncidentDraft {
    /// Validate raw fields into a draft.
    ///
    /// # Examples
    /// ```
    /// use citizens_backend::domain::{IncidentDraft, IncidentFields, IncidentType};
    ///
    /// let draft = IncidentDraft::try_from_fields(IncidentFields {
    ///     incident_type: Some("Fire".into()),
    ///     title: Some("  Warehouse blaze ".into()),
    ///     ..IncidentFields::default()
    /// })
    /// .unwrap();
    /// assert_eq!(draft.incident_type(), IncidentType::Fire);
    /// assert_eq!(draft.title(), Some("Warehouse blaze"));
    /// ```
    pub fn try_from_fields(fields: IncidentFields) -> Result<Self, IncidentValidationError> {
        let incident_type = fields
            .incident_type
            .as_deref()
            .ok_or(IncidentValidationError::MissingType)?
            .parse::<IncidentType>()?;

        Ok(Self {
            incident_type,
            title: normalise_text(fields.title, "title", TITLE_MAX)?,
            description: normalise_text(fields.description, "description", DESCRIPTION_MAX)?,
            location: normalise_text(fields.location, "location", LOCATION_MAX)?,
            latitude: check_coordinate(fields.latitude, 90.0)
                .map_err(|value| IncidentValidationError::LatitudeOutOfRange { value })?,
            longitude: check_coordinate(fields.longitude, 180.0)
                .map_err(|value| IncidentValidationError::LongitudeOutOfRange { value })?,
        })
    }

    pub fn incident_type(&self) -> IncidentType {
        self.incident_type
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }
}

fn normalise_text(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, IncidentValidationError> {
    let Some(trimmed) = value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    else {
        return Ok(None);
    };
    if trimmed.chars().count() > max {
        return Err(IncidentValidationError::TextTooLong { field, max });
    }
    Ok(Some(trimmed.to_owned()))
}

fn check_coordinate(value: Option<f64>, bound: f64) -> Result<Option<f64>, f64> {
    match value {
        Some(v) if !v.is_finite() || v.abs() > bound => Err(v),
        other => Ok(other),
    }
}

/// Everything needed to create a report.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentSubmission {
    draft: IncidentDraft,
    images: Vec<ImageUpload>,
    creator: Option<UserId>,
}

impl IncidentSubmission {
    /// Bundle a draft with its photos and optional author.
    pub fn new(
        draft: IncidentDraft,
        images: Vec<ImageUpload>,
        creator: Option<UserId>,
    ) -> Result<Self, IncidentValidationError> {
        if images.len() > MAX_IMAGES {
            return Err(IncidentValidationError::TooManyImages { max: MAX_IMAGES });
        }
        Ok(Self {
            draft,
            images,
            creator,
        })
    }

    pub fn draft(&self) -> &IncidentDraft {
        &self.draft
    }

    pub fn creator(&self) -> Option<UserId> {
        self.creator
    }

    /// Split into parts for the ingestion pipeline.
    pub fn into_parts(self) -> (IncidentDraft, Vec<ImageUpload>, Option<UserId>) {
        (self.draft, self.images, self.creator)
    }
}

/// Persisted incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: IncidentId,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<ImageRef>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Incident {
    /// Stamp a draft with its identity, stored images and creation time.
    pub fn from_draft(
        id: IncidentId,
        draft: IncidentDraft,
        images: Vec<ImageRef>,
        user_id: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let IncidentDraft {
            incident_type,
            title,
            description,
            location,
            latitude,
            longitude,
        } = draft;
        Self {
            id,
            incident_type,
            title,
            description,
            location,
            latitude,
            longitude,
            images,
            user_id,
            created_at,
        }
    }
}
