//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities used by the API and persistence
//! layers, plus the services that implement the driving ports. Keep types
//! immutable and document invariants and serialisation contracts (serde) in
//! each type's Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, UserId, Email, UserAccount: account holders.
//! - LoginCredentials, RegistrationCredentials, AccessToken, AuthSession.
//! - Incident and its draft/submission/image types.
//! - AccountService, IncidentService: port implementations.

pub mod account_service;
pub mod auth;
pub mod error;
pub mod incident;
pub mod incident_service;
pub mod ports;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::auth::{
    AccessToken, AuthSession, CredentialsValidationError, INVALID_CREDENTIALS, LoginCredentials,
    PASSWORD_MIN, RegistrationCredentials, TokenClaims,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::incident::{
    ImageRef, ImageUpload, Incident, IncidentDraft, IncidentFields, IncidentId,
    IncidentSubmission, IncidentType, IncidentValidationError, MAX_IMAGES, UPLOADS_PREFIX,
};
pub use self::incident_service::IncidentService;
pub use self::trace_id::TraceId;
pub use self::user::{Email, PasswordHash, User, UserAccount, UserId, UserValidationError};
