//! Axum extractors for authenticated routes.
//!
//! - [`BearerToken`]: pulls the token out of `Authorization: Bearer <t>`.
//! - [`AuthUser`]: resolves the token through the session collaborator;
//!   using it as a handler parameter makes the route require auth.

use super::SessionProvider;
use crate::error::Error;
use crate::server::state::AppState;
use crate::types::UserId;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Bearer token extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::Unauthorized {
                message: "missing authorization header".to_string(),
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Unauthorized {
                message: "invalid authorization format, expected 'Bearer <token>'".to_string(),
            })?;

        if token.is_empty() {
            return Err(Error::Unauthorized {
                message: "empty bearer token".to_string(),
            });
        }

        Ok(Self(token.to_string()))
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The resolved user id
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        let sessions: &Arc<dyn SessionProvider> = &state.sessions;

        let user_id = sessions
            .resolve(&bearer.0)
            .await?
            .ok_or_else(|| Error::Unauthorized {
                message: "invalid or expired session".to_string(),
            })?;

        Ok(Self { user_id })
    }
}
