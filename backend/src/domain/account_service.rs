//! Account use-cases: registration, login and current-user lookup.
//!
//! The service composes the user repository, password hasher and token
//! issuer behind the driving ports consumed by the HTTP adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{
    LoginService, PasswordHashError, PasswordHasher, RegistrationService, TokenError,
    TokenService, UserPersistenceError, UserRepository, UsersQuery,
};
use crate::domain::{
    AuthSession, Error, INVALID_CREDENTIALS, LoginCredentials, RegistrationCredentials, User,
    UserAccount, UserId,
};

/// Map user persistence failures to domain errors.
pub(crate) fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
        UserPersistenceError::DuplicateEmail { .. } => {
            Error::conflict("an account with this email already exists")
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

fn map_token_error(error: TokenError) -> Error {
    Error::internal(error.to_string())
}

/// Account service backed by driven ports.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    /// Create a service from its collaborators.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    fn sign_in(&self, user: User) -> Result<AuthSession, Error> {
        let token = self.tokens.issue(&user).map_err(map_token_error)?;
        Ok(AuthSession { token, user })
    }
}

#[async_trait]
impl RegistrationService for AccountService {
    async fn register(&self, credentials: &RegistrationCredentials) -> Result<AuthSession, Error> {
        let email = credentials.email();
        let existing = self
            .users
            .find_by_email(email)
            .await
            .map_err(map_user_persistence_error)?;
        if existing.is_some() {
            debug!("registration rejected: email already registered");
            return Err(Error::conflict("an account with this email already exists"));
        }

        let password_hash = self
            .hasher
            .hash(credentials.password())
            .await
            .map_err(map_hash_error)?;
        let user = User::new(UserId::random(), email.clone());
        self.users
            .insert(&UserAccount {
                user: user.clone(),
                password_hash,
            })
            .await
            .map_err(map_user_persistence_error)?;

        info!(user_id = %user.id(), "account registered");
        self.sign_in(user)
    }
}

#[async_trait]
impl LoginService for AccountService {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, Error> {
        let Some(account) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_persistence_error)?
        else {
            debug!("login rejected: unknown email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !matches {
            debug!(user_id = %account.user.id(), "login rejected: password mismatch");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        info!(user_id = %account.user.id(), "user logged in");
        self.sign_in(account.user)
    }
}

#[async_trait]
impl UsersQuery for AccountService {
    async fn current_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(|| Error::unauthorized("account no longer exists"))
    }
}
