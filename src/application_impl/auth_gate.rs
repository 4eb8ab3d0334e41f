use crate::application_port::*;
use std::future::Future;
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Precondition of every relationship and profile operation: resolves the
/// request's `Authorization` header to an [`Actor`].
#[derive(Clone)]
pub struct AuthGate {
    auth_service: Arc<dyn AuthService>,
}

impl AuthGate {
    pub fn new(auth_service: Arc<dyn AuthService>) -> Self {
        Self { auth_service }
    }

    pub async fn require_actor(&self, authorization: Option<&str>) -> Result<Actor, AuthError> {
        let token = authorization
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let user_id = self.auth_service.verify_token(token).await?;
        Ok(Actor::authenticated(user_id))
    }

    /// Runs `next` with the resolved actor. `next` is never invoked when the
    /// credential does not resolve.
    pub async fn guard<T, E, F, Fut>(&self, authorization: Option<&str>, next: F) -> Result<T, E>
    where
        F: FnOnce(Actor) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AuthError>,
    {
        let actor = self.require_actor(authorization).await?;
        next(actor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::FakeAuthService;
    use crate::domain_model::UserId;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn gate() -> AuthGate {
        AuthGate::new(Arc::new(FakeAuthService::new()))
    }

    #[tokio::test]
    async fn bearer_token_resolves_to_actor() {
        let header = format!("Bearer {}", FakeAuthService::token_for("alice"));
        let actor = gate().require_actor(Some(header.as_str())).await.unwrap();
        assert_eq!(actor.user_id(), &UserId("alice".to_string()));
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_unauthenticated() {
        let gate = gate();
        for header in [None, Some(""), Some("Bearer "), Some("Basic abc"), Some("fake-access-token:alice")] {
            assert_eq!(
                gate.require_actor(header).await,
                Err(AuthError::MissingCredential),
                "{header:?}"
            );
        }
        assert_eq!(
            gate.require_actor(Some("Bearer garbage")).await,
            Err(AuthError::TokenInvalid)
        );
    }

    #[tokio::test]
    async fn guard_skips_the_operation_when_unauthenticated() {
        let ran = AtomicBool::new(false);
        let result: Result<(), AuthError> = gate()
            .guard(Some("Bearer garbage"), |_actor| async {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert_eq!(result, Err(AuthError::TokenInvalid));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn guard_passes_the_actor_through() {
        let header = format!("Bearer {}", FakeAuthService::token_for("bob"));
        let seen: Result<UserId, AuthError> = gate()
            .guard(Some(header.as_str()), |actor| async move { Ok(actor.user_id().clone()) })
            .await;
        assert_eq!(seen.unwrap(), UserId("bob".to_string()));
    }
}
