use crate::application_port::*;
use crate::domain_model::UserId;

pub const FAKE_TOKEN_PREFIX: &str = "fake-access-token:";

#[derive(Debug, Default)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }

    pub fn token_for(user_id: &str) -> String {
        format!("{FAKE_TOKEN_PREFIX}{user_id}")
    }
}

// Accepts `fake-access-token:<user id>` for local development.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        token
            .strip_prefix(FAKE_TOKEN_PREFIX)
            .ok_or(AuthError::TokenInvalid)?
            .parse::<UserId>()
            .map_err(|_| AuthError::TokenInvalid)
    }
}
