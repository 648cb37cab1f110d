//! Authentication collaborator.
//!
//! Session mechanics are external to this system: the booking core only
//! consumes the capability "the caller is authenticated as user U". The
//! [`SessionProvider`] trait is that seam; [`StaticSessionProvider`] is the
//! in-process implementation used for development, demos and tests.

pub mod middleware;

pub use middleware::{AuthUser, BearerToken};

use crate::error::Result;
use crate::types::UserId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Resolves bearer tokens to authenticated users.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the user the token belongs to, or `None` for unknown tokens.
    async fn resolve(&self, token: &str) -> Result<Option<UserId>>;
}

/// Token-to-user map standing in for a real session backend.
#[derive(Debug, Default)]
pub struct StaticSessionProvider {
    tokens: Mutex<HashMap<String, UserId>>,
}

impl StaticSessionProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh opaque token for `user`.
    pub fn issue(&self, user: UserId) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), user);
        token
    }

    /// Registers a caller-chosen token (tests, demo fixtures).
    pub fn insert(&self, token: impl Into<String>, user: UserId) {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), user);
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn resolve(&self, token: &str) -> Result<Option<UserId>> {
        Ok(self
            .tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .copied())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_tokens_resolve_to_their_user() {
        let provider = StaticSessionProvider::new();
        let user = UserId::new();
        let token = provider.issue(user);

        assert_eq!(provider.resolve(&token).await.unwrap(), Some(user));
        assert_eq!(provider.resolve("stranger").await.unwrap(), None);
    }
}
