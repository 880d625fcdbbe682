//! `PasswordHasher` backed by bcrypt.
//!
//! bcrypt is deliberately slow, so both operations run on the blocking
//! thread pool rather than an async worker.

use async_trait::async_trait;
use tokio::task;
use zeroize::Zeroizing;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// bcrypt hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Hasher using `cost` rounds (log2). bcrypt accepts 4 to 31.
    ///
    /// # Errors
    ///
    /// [`PasswordHashError::Hash`] when `cost` is outside that range.
    pub fn new(cost: u32) -> Result<Self, PasswordHashError> {
        if !(4..=31).contains(&cost) {
            return Err(PasswordHashError::hash(format!(
                "bcrypt cost must be between 4 and 31, got {cost}"
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

fn map_join_error(error: task::JoinError) -> PasswordHashError {
    PasswordHashError::worker(error.to_string())
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        let cost = self.cost;
        let encoded = task::spawn_blocking(move || bcrypt::hash(password.as_bytes(), cost))
            .await
            .map_err(map_join_error)?
            .map_err(|err| PasswordHashError::hash(err.to_string()))?;
        Ok(PasswordHash::new(encoded))
    }

    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        let encoded = hash.as_str().to_owned();
        task::spawn_blocking(move || bcrypt::verify(password.as_bytes(), &encoded))
            .await
            .map_err(map_join_error)?
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }
}
