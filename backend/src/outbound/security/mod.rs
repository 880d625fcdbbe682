//! Credential adapters: bcrypt password hashing and HS256 bearer tokens.

mod bcrypt_hasher;
mod jwt_token_service;

pub use bcrypt_hasher::BcryptPasswordHasher;
pub use jwt_token_service::{DEFAULT_TOKEN_TTL, JwtSettings, JwtTokenService};
