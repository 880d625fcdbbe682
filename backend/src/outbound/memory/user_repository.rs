//! `UserRepository` over a mutex-guarded map keyed by normalised email.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Email, User, UserAccount, UserId};

/// Accounts held in memory.
#[derive(Default)]
pub struct InMemoryUserRepository {
    accounts: Mutex<HashMap<String, UserAccount>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<String, UserAccount>>, UserPersistenceError> {
        self.accounts
            .lock()
            .map_err(|_| UserPersistenceError::query("user store lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut accounts = self.accounts()?;
        let key = account.user.email().as_ref().to_owned();
        if accounts.contains_key(&key) {
            return Err(UserPersistenceError::duplicate_email(key));
        }
        accounts.insert(key, account.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(self.accounts()?.get(email.as_ref()).cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .accounts()?
            .values()
            .find(|account| account.user.id() == id)
            .map(|account| account.user.clone()))
    }
}
