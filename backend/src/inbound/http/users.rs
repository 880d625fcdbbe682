//! Account API handlers.
//!
//! ```text
//! POST /auth/register {"email":"ada@example.com","password":"secret"}
//! POST /auth/login {"email":"ada@example.com","password":"secret"}
//! GET /api/users/me    (Authorization: Bearer <token>)
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    AuthSession, CredentialsValidationError, Error, INVALID_CREDENTIALS, LoginCredentials,
    RegistrationCredentials, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerUser;
use crate::inbound::http::state::HttpState;

/// Credentials body shared by `POST /auth/register` and `POST /auth/login`.
///
/// Missing fields deserialize as empty strings so validation reports them
/// with field-level details instead of a generic JSON error.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn map_credentials_error(err: CredentialsValidationError) -> Error {
    let (field, code) = match &err {
        CredentialsValidationError::EmptyEmail => ("email", "empty_email"),
        CredentialsValidationError::InvalidEmail => ("email", "invalid_email"),
        CredentialsValidationError::EmptyPassword => ("password", "empty_password"),
        CredentialsValidationError::PasswordTooShort { .. } => ("password", "password_too_short"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Login only reports missing fields; a malformed address cannot match an
/// account, so it fails like an unknown one.
fn map_login_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::InvalidEmail => Error::unauthorized(INVALID_CREDENTIALS),
        other => map_credentials_error(other),
    }
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created", body = crate::inbound::http::schemas::AuthSessionSchema),
        (status = 400, description = "Invalid request", body = crate::inbound::http::schemas::ErrorSchema),
        (status = 409, description = "Email already registered", body = crate::inbound::http::schemas::ErrorSchema),
        (status = 503, description = "Storage unavailable", body = crate::inbound::http::schemas::ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let CredentialsRequest { email, password } = payload.into_inner();
    let credentials =
        RegistrationCredentials::try_from_parts(&email, &password).map_err(map_credentials_error)?;
    let session: AuthSession = state.registration.register(&credentials).await?;
    Ok(HttpResponse::Created().json(session))
}

/// Exchange credentials for a bearer token.
///
/// Unknown or malformed emails and wrong passwords produce the same `401`
/// response; only missing fields are rejected with `400`.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login success", body = crate::inbound::http::schemas::AuthSessionSchema),
        (status = 400, description = "Invalid request", body = crate::inbound::http::schemas::ErrorSchema),
        (status = 401, description = "Invalid credentials", body = crate::inbound::http::schemas::ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<AuthSession>> {
    let CredentialsRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(map_login_error)?;
    state.login.login(&credentials).await.map(web::Json)
}

/// Return the account identified by the bearer token.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use citizens_backend::inbound::http::users::current_user;
///
/// let app = App::new().service(web::scope("/api").service(current_user));
/// ```
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Authenticated user", body = crate::inbound::http::schemas::UserSchema),
        (status = 401, description = "Missing, invalid or expired token", body = crate::inbound::http::schemas::ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    BearerUser(claims): BearerUser,
) -> ApiResult<web::Json<User>> {
    state.users.current_user(&claims.user_id).await.map(web::Json)
}
