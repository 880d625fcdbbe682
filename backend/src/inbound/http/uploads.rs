//! Serve stored incident photos.
//!
//! ```text
//! GET /uploads/3f2b9c7e-....jpg
//! ```

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};

use crate::domain::Error;
use crate::domain::ports::ImageStoreError;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Stored files are immutable, so clients may cache them for a day.
const CACHE_POLICY: &str = "public, max-age=86400, immutable";

/// Return the bytes of a stored image.
#[utoipa::path(
    get,
    path = "/uploads/{name}",
    params(("name" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*", body = Vec<u8>),
        (status = 404, description = "No such image", body = crate::inbound::http::schemas::ErrorSchema)
    ),
    tags = ["uploads"],
    operation_id = "getUpload",
    security([])
)]
#[get("/uploads/{name}")]
pub async fn get_upload(
    state: web::Data<HttpState>,
    name: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let name = name.into_inner();
    let image = match state.images.load(&name).await {
        Ok(Some(image)) => image,
        Ok(None) | Err(ImageStoreError::InvalidName { .. }) => {
            return Err(Error::not_found(format!("no image named {name}")));
        }
        Err(err) => return Err(Error::internal(err.to_string())),
    };
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, image.content_type))
        .insert_header((header::CACHE_CONTROL, CACHE_POLICY))
        .body(image.bytes))
}
