//! Authentication primitives: credentials, issued tokens and their claims.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use serde::Serialize;
use zeroize::Zeroizing;

use super::user::{Email, User, UserId, UserValidationError};

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN: usize = 6;

/// Message for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email was present but malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than the registration minimum.
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

impl From<UserValidationError> for CredentialsValidationError {
    fn from(value: UserValidationError) -> Self {
        match value {
            UserValidationError::EmptyEmail => Self::EmptyEmail,
            _ => Self::InvalidEmail,
        }
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised (see [`Email`]).
/// - `password` is non-empty and keeps caller-provided whitespace; it is
///   wiped from memory when dropped.
///
/// # Examples
/// ```
/// use citizens_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "secret").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for lookups.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Credentials for a new account; login rules plus the minimum length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationCredentials(LoginCredentials);

impl RegistrationCredentials {
    /// Construct registration credentials from raw inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        if password.chars().count() < PASSWORD_MIN {
            return Err(CredentialsValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(credentials))
    }

    /// Normalised email for the new account.
    pub fn email(&self) -> &Email {
        self.0.email()
    }

    /// Plaintext password to hash.
    pub fn password(&self) -> &str {
        self.0.password()
    }
}

/// Opaque bearer token handed to clients.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap an encoded token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Encoded token string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Identity asserted by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub email: Email,
}

/// Result of a successful registration or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub token: AccessToken,
    pub user: User,
}
