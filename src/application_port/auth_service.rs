use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Everything except a failure to mint a token means the caller is not authenticated.
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(self, AuthError::InternalError(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: &UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError>;
}

/// Resolves a bearer token to the user it was issued for.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
}

/// The caller of the current request, as resolved from its credential.
///
/// Only the authorization gate constructs an `Actor`, so services taking one
/// can trust its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
}

impl Actor {
    pub(crate) fn authenticated(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}
