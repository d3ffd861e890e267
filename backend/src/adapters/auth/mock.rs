//! Mock intent authenticator for testing.
//!
//! Maps opaque bearer strings to callers so HTTP tests need no signed JWTs.
//!
//! # Example
//!
//! ```ignore
//! let auth = MockIntentAuthenticator::new()
//!     .with_user("user-token", "42")
//!     .with_issuer("admin-token", "7");
//! ```

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, Caller, Identity};
use crate::ports::IntentAuthenticator;

/// Tokens not registered return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockIntentAuthenticator {
    tokens: RwLock<HashMap<String, Caller>>,
    /// Returned for every call when set.
    force_error: RwLock<Option<AuthError>>,
}

impl MockIntentAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caller(self, token: impl Into<String>, caller: Caller) -> Self {
        write(&self.tokens).insert(token.into(), caller);
        self
    }

    /// Registers a regular user. Ignores identities that fail validation.
    pub fn with_user(self, token: impl Into<String>, identity: &str) -> Self {
        match Identity::new(identity) {
            Ok(identity) => self.with_caller(token, Caller::user(identity)),
            Err(_) => self,
        }
    }

    /// Registers a caller allowed to mint credit codes.
    pub fn with_issuer(self, token: impl Into<String>, identity: &str) -> Self {
        match Identity::new(identity) {
            Ok(identity) => self.with_caller(token, Caller::issuer(identity)),
            Err(_) => self,
        }
    }

    pub fn with_error(self, error: AuthError) -> Self {
        *write(&self.force_error) = Some(error);
        self
    }

    pub fn clear_error(&self) {
        *write(&self.force_error) = None;
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl IntentAuthenticator for MockIntentAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Caller, AuthError> {
        if let Some(error) = read(&self.force_error).clone() {
            return Err(error);
        }

        read(&self.tokens)
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
