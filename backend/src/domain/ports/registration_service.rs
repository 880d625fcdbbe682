//! Driving port for account creation.

use async_trait::async_trait;

use crate::domain::{AuthSession, Error, RegistrationCredentials};

/// Domain use-case port for registering new accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Create an account and sign it in.
    ///
    /// Fails with [`crate::domain::ErrorCode::Conflict`] when the normalised
    /// email is already registered.
    async fn register(&self, credentials: &RegistrationCredentials) -> Result<AuthSession, Error>;
}
