//! `multipart/form-data` decoding for incident reports.
//!
//! Text parts map onto [`IncidentFields`]; every `images` part becomes an
//! [`ImageUpload`]. Parts are read with explicit size limits so a single
//! oversized upload is rejected before it is fully buffered.

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::guard::GuardContext;
use actix_web::http::header;
use futures_util::StreamExt;
use serde_json::json;

use crate::domain::{Error, ImageUpload, IncidentFields, IncidentValidationError, MAX_IMAGES};

use super::incidents::{map_incident_validation_error, parse_coordinate};

/// Upper bound for a single text part.
const TEXT_FIELD_MAX: usize = 64 * 1024;
/// Form part carrying photos.
pub const IMAGES_FIELD: &str = "images";

/// Decoded report form.
#[derive(Debug, Default)]
pub struct IncidentForm {
    pub fields: IncidentFields,
    pub images: Vec<ImageUpload>,
}

/// Route guard selecting `multipart/form-data` requests.
pub fn is_multipart(ctx: &GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

fn multipart_error(err: MultipartError) -> Error {
    Error::invalid_request(format!("malformed multipart body: {err}"))
}

fn too_large(field: &str, max: usize) -> Error {
    Error::invalid_request(format!("{field} exceeds {max} bytes"))
        .with_details(json!({ "field": field, "code": "too_large", "max": max }))
}

async fn read_limited(field: &mut Field, name: &str, max: usize) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(multipart_error)?;
        if buffer.len() + chunk.len() > max {
            return Err(too_large(name, max));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, Error> {
    let bytes = read_limited(field, name, TEXT_FIELD_MAX).await?;
    String::from_utf8(bytes).map_err(|_| {
        Error::invalid_request(format!("{name} must be UTF-8 text"))
            .with_details(json!({ "field": name, "code": "invalid_encoding" }))
    })
}

/// Drain a multipart body into an [`IncidentForm`].
///
/// Unknown parts are discarded. Image parts without a file name and without
/// content (an empty file input) are skipped.
pub async fn read_incident_form(
    mut payload: Multipart,
    max_image_bytes: usize,
) -> Result<IncidentForm, Error> {
    let mut form = IncidentForm::default();
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(multipart_error)?;
        let disposition = field.content_disposition();
        let name = disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_owned();
        let file_name = disposition
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        match name.as_str() {
            IMAGES_FIELD => {
                let content_type = field.content_type().map(|mime| mime.essence_str().to_owned());
                let bytes = read_limited(&mut field, IMAGES_FIELD, max_image_bytes).await?;
                if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                    continue;
                }
                if form.images.len() == MAX_IMAGES {
                    return Err(map_incident_validation_error(
                        IncidentValidationError::TooManyImages { max: MAX_IMAGES },
                    ));
                }
                let upload = ImageUpload::try_new(file_name, content_type.as_deref(), bytes)
                    .map_err(map_incident_validation_error)?;
                form.images.push(upload);
            }
            "type" => form.fields.incident_type = Some(read_text(&mut field, "type").await?),
            "title" => form.fields.title = Some(read_text(&mut field, "title").await?),
            "description" => {
                form.fields.description = Some(read_text(&mut field, "description").await?);
            }
            "location" => form.fields.location = Some(read_text(&mut field, "location").await?),
            "latitude" => {
                let raw = read_text(&mut field, "latitude").await?;
                form.fields.latitude = parse_coordinate("latitude", &raw)?;
            }
            "longitude" => {
                let raw = read_text(&mut field, "longitude").await?;
                form.fields.longitude = parse_coordinate("longitude", &raw)?;
            }
            _ => {
                while let Some(chunk) = field.next().await {
                    chunk.map_err(multipart_error)?;
                }
            }
        }
    }
    Ok(form)
}
