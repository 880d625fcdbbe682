//! `TokenService` issuing HS256 JSON Web Tokens.
//!
//! Expiry is checked against the injected clock rather than the system time
//! so issuance and verification always agree on "now".

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::ports::{TokenError, TokenService};
use crate::domain::{AccessToken, Email, TokenClaims, User, UserId};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Signing secret and token lifetime.
#[derive(Clone)]
pub struct JwtSettings {
    secret: Zeroizing<Vec<u8>>,
    ttl: Duration,
}

impl JwtSettings {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Registered claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

/// HS256 token issuer and verifier.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl JwtTokenService {
    pub fn new(settings: &JwtSettings, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(&settings.secret),
            decoding: DecodingKey::from_secret(&settings.secret),
            ttl_secs: i64::try_from(settings.ttl.as_secs()).unwrap_or(i64::MAX),
            clock,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::ExpiredSignature => TokenError::expired(),
        _ => TokenError::invalid(error.to_string()),
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &User) -> Result<AccessToken, TokenError> {
        let iat = self.clock.utc().timestamp();
        let claims = Claims {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(AccessToken::new)
            .map_err(|err| TokenError::issue(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &Self::validation())
            .map_err(map_decode_error)?
            .claims;
        if claims.exp <= self.clock.utc().timestamp() {
            return Err(TokenError::expired());
        }
        let user_id = UserId::new(&claims.sub)
            .map_err(|err| TokenError::invalid(format!("subject: {err}")))?;
        let email = Email::new(&claims.email)
            .map_err(|err| TokenError::invalid(format!("email: {err}")))?;
        Ok(TokenClaims { user_id, email })
    }
}
