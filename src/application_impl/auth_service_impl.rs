use crate::application_port::*;
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String, // user id
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
}

fn encode_access(uid: &UserId, cfg: &JwtConfig) -> Result<(String, DateTime<Utc>), AuthError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + cfg.access_ttl;
    let claims = AccessClaims {
        sub: uid.to_string(),
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
        jti: uuid::Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn decode_access(token: &str, cfg: &JwtConfig) -> Result<AccessClaims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.leeway = 0;
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    Ok(data.claims)
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    #[inline]
    fn parse_user_id(sub: &str) -> Result<UserId, AuthError> {
        sub.parse::<UserId>().map_err(|_| AuthError::TokenInvalid)
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: &UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = encode_access(user, &self.cfg)?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError> {
        let claims = decode_access(&token.0, &self.cfg)?;
        Self::parse_user_id(&claims.sub)
    }
}

pub struct RealAuthService {
    token_codec: Arc<dyn TokenCodec>,
}

impl RealAuthService {
    pub fn new(token_codec: Arc<dyn TokenCodec>) -> Self {
        Self { token_codec }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        self.token_codec
            .verify_access_token(&AccessToken(token.to_string()))
            .await
            .inspect_err(|e| tracing::debug!("token rejected: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str) -> JwtConfig {
        JwtConfig {
            issuer: "fellowship.auth".to_string(),
            audience: "fellowship-client".to_string(),
            access_ttl: Duration::from_secs(60),
            signing_key: key.as_bytes().to_vec(),
        }
    }

    fn token_with(claims: &AccessClaims, key: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str, exp: i64) -> AccessClaims {
        AccessClaims {
            sub: sub.to_string(),
            exp,
            iat: Utc::now().timestamp(),
            iss: "fellowship.auth".to_string(),
            aud: "fellowship-client".to_string(),
            jti: "jti-1".to_string(),
        }
    }

    #[tokio::test]
    async fn issued_token_resolves_to_its_subject() {
        let codec = Arc::new(JwtHs256Codec::new(config("secret")));
        let (token, expires_at) = codec
            .issue_access_token(&UserId("auth0|alice".to_string()))
            .await
            .unwrap();
        assert!(expires_at > Utc::now());

        let service = RealAuthService::new(codec);
        assert_eq!(
            service.verify_token(&token.0).await,
            Ok(UserId("auth0|alice".to_string()))
        );
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let service = RealAuthService::new(Arc::new(JwtHs256Codec::new(config("secret"))));
        let token = token_with(&claims("alice", Utc::now().timestamp() - 10), "secret");
        assert_eq!(service.verify_token(&token).await, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn foreign_signature_is_rejected() {
        let service = RealAuthService::new(Arc::new(JwtHs256Codec::new(config("secret"))));
        let token = token_with(&claims("alice", Utc::now().timestamp() + 60), "other-secret");
        assert_eq!(service.verify_token(&token).await, Err(AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn wrong_audience_is_rejected() {
        let service = RealAuthService::new(Arc::new(JwtHs256Codec::new(config("secret"))));
        let mut c = claims("alice", Utc::now().timestamp() + 60);
        c.aud = "someone-else".to_string();
        let token = token_with(&c, "secret");
        assert_eq!(service.verify_token(&token).await, Err(AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn malformed_and_empty_subjects_are_rejected() {
        let service = RealAuthService::new(Arc::new(JwtHs256Codec::new(config("secret"))));
        assert_eq!(service.verify_token("not-a-jwt").await, Err(AuthError::TokenInvalid));

        let token = token_with(&claims("  ", Utc::now().timestamp() + 60), "secret");
        assert_eq!(service.verify_token(&token).await, Err(AuthError::TokenInvalid));
    }
}
