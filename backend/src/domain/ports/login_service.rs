//! Driving port for login/authentication use-cases.
//!
//! In hexagonal terms this is a *driving* port: inbound adapters call it to
//! authenticate credentials without knowing (or importing) the backing
//! infrastructure, so handler tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{AuthSession, Error, LoginCredentials};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and issue a session token.
    ///
    /// Unknown emails and wrong passwords are indistinguishable to callers:
    /// both yield [`crate::domain::ErrorCode::Unauthorized`].
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, Error>;
}
