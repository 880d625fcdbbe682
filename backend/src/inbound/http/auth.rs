//! Bearer-token extractors used by HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by concentrating
//! `Authorization` header parsing and token verification here.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use tracing::debug;

use crate::domain::ports::TokenError;
use crate::domain::{Error, TokenClaims};

use super::state::HttpState;

/// Identity of a request that must carry a valid bearer token.
#[derive(Debug, Clone)]
pub struct BearerUser(pub TokenClaims);

/// Identity of a request where a bearer token is optional.
///
/// A missing header yields `None`; a present but invalid token is still
/// rejected with `401`.
#[derive(Debug, Clone)]
pub struct OptionalBearerUser(pub Option<TokenClaims>);

fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, Error> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header must be visible ASCII"))?;
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(Error::unauthorized(
            "authorization header must use the Bearer scheme",
        ));
    }
    Ok(Some(token))
}

fn map_token_error(err: TokenError) -> Error {
    debug!(error = %err, "bearer token rejected");
    match err {
        TokenError::Expired => Error::unauthorized("token has expired"),
        TokenError::Invalid { .. } => Error::unauthorized("invalid token"),
        TokenError::Issue { message } => Error::internal(message),
    }
}

fn verify_request(req: &HttpRequest) -> Result<Option<TokenClaims>, Error> {
    let Some(token) = bearer_token(req)? else {
        return Ok(None);
    };
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
    state.tokens.verify(token).map(Some).map_err(map_token_error)
}

impl FromRequest for BearerUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(verify_request(req).and_then(|claims| {
            claims
                .map(Self)
                .ok_or_else(|| Error::unauthorized("bearer token required"))
        }))
    }
}

impl FromRequest for OptionalBearerUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(verify_request(req).map(Self))
    }
}
