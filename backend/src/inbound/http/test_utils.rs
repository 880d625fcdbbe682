//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::web;

use crate::domain::ports::{
    MockImageStore, MockIncidentCommand, MockIncidentQuery, MockLoginService,
    MockRegistrationService, MockTokenService, MockUsersQuery,
};
use crate::domain::{Email, TokenClaims, UserId};

use super::state::{HttpState, HttpStatePorts};

/// Fixture user id shared by handler tests.
pub const FIXTURE_USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

/// Mock port bundle; set expectations on the fields that a test exercises.
#[derive(Default)]
pub struct TestPorts {
    pub registration: MockRegistrationService,
    pub login: MockLoginService,
    pub users: MockUsersQuery,
    pub tokens: MockTokenService,
    pub incidents: MockIncidentCommand,
    pub incidents_query: MockIncidentQuery,
    pub images: MockImageStore,
}

impl TestPorts {
    /// Wrap the mocks into handler state.
    pub fn into_state(self) -> web::Data<HttpState> {
        self.into_state_with_limit(crate::inbound::http::state::DEFAULT_MAX_IMAGE_BYTES)
    }

    /// Wrap the mocks into handler state with a custom upload limit.
    pub fn into_state_with_limit(self, max_image_bytes: usize) -> web::Data<HttpState> {
        let ports = HttpStatePorts {
            registration: Arc::new(self.registration),
            login: Arc::new(self.login),
            users: Arc::new(self.users),
            tokens: Arc::new(self.tokens),
            incidents: Arc::new(self.incidents),
            incidents_query: Arc::new(self.incidents_query),
            images: Arc::new(self.images),
        };
        web::Data::new(HttpState::new(ports, max_image_bytes))
    }
}

/// Claims for the fixture user.
pub fn fixture_claims() -> TokenClaims {
    TokenClaims {
        user_id: UserId::new(FIXTURE_USER_ID).expect("fixture id"),
        email: Email::new("ada@example.com").expect("fixture email"),
    }
}

/// Token service mock accepting exactly `token` as the fixture user.
pub fn accepting_token(token: &'static str) -> MockTokenService {
    let mut tokens = MockTokenService::new();
    tokens
        .expect_verify()
        .returning(move |presented| {
            if presented == token {
                Ok(fixture_claims())
            } else {
                Err(crate::domain::ports::TokenError::invalid("signature mismatch"))
            }
        });
    tokens
}
