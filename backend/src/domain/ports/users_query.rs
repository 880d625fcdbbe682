//! Driving port for reading account details.

use async_trait::async_trait;

use crate::domain::{Error, User, UserId};

/// Domain use-case port for user lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Fetch the user a verified token refers to.
    ///
    /// A token may outlive its account, so a missing user is reported as
    /// [`crate::domain::ErrorCode::Unauthorized`] rather than not-found.
    async fn current_user(&self, id: &UserId) -> Result<User, Error>;
}
