//! Port for issuing and verifying bearer tokens.
use crate::domain::{AccessToken, TokenClaims, User};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum TokenError {
        /// The token could not be encoded.
        Issue { message: String } => "token issue failed: {message}",
        /// The token is malformed, tampered with or signed with another key.
        Invalid { message: String } => "invalid token: {message}",
        /// The token was valid but has expired.
        Expired => "token has expired",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Issue a token identifying `user`.
    fn issue(&self, user: &User) -> Result<AccessToken, TokenError>;

    /// Verify a presented token and return its claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}
