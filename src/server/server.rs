use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::{self, Settings};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;

#[cfg(debug_assertions)]
const DEV_SIGNING_KEY: &str = "my-dev-secret-key";

/// Services assembled once at startup and shared by every request.
pub struct Server {
    pub auth_gate: AuthGate,
    pub user_service: Arc<dyn UserService>,
    pub relationship_service: Arc<dyn RelationshipService>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let profile_repo: Arc<dyn ProfileRepo>;
        let friendship_store: Arc<dyn FriendshipStore>;
        let mut pool = None;
        match settings.store.backend.as_str() {
            "memory" => {
                profile_repo = Arc::new(MemoryProfileRepo::new());
                friendship_store = Arc::new(MemoryFriendshipStore::new());
            }
            "mysql" => {
                let dsn = settings
                    .store
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.mysql_dsn is required for mysql"))?;
                let mysql = MySqlPoolOptions::new()
                    .max_connections(settings.store.max_connections)
                    .connect(dsn)
                    .await?;
                profile_repo = Arc::new(MySqlProfileRepo::new(mysql.clone()));
                friendship_store = Arc::new(MySqlFriendshipStore::new(mysql.clone()));
                pool = Some(mysql);
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        }

        let auth_service: Arc<dyn AuthService> = match settings.auth.backend.as_str() {
            "fake" => {
                warn!("fake auth backend accepts unsigned tokens");
                Arc::new(FakeAuthService::new())
            }
            "real" => Arc::new(RealAuthService::new(Arc::new(JwtHs256Codec::new(
                jwt_config(&settings.auth)?,
            )))),
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        info!(
            store = %settings.store.backend,
            auth = %settings.auth.backend,
            "server started"
        );

        Ok(Self {
            pool,
            ..Self::from_parts(auth_service, profile_repo, friendship_store)
        })
    }

    pub fn from_parts(
        auth_service: Arc<dyn AuthService>,
        profile_repo: Arc<dyn ProfileRepo>,
        friendship_store: Arc<dyn FriendshipStore>,
    ) -> Self {
        Self {
            auth_gate: AuthGate::new(auth_service),
            user_service: Arc::new(RealUserService::new(profile_repo.clone())),
            relationship_service: Arc::new(RealRelationshipService::new(
                profile_repo,
                friendship_store,
            )),
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

pub fn jwt_config(auth: &settings::Auth) -> anyhow::Result<JwtConfig> {
    Ok(JwtConfig {
        issuer: auth.issuer.clone(),
        audience: auth.audience.clone(),
        access_ttl: Duration::from_secs(auth.access_ttl_secs),
        signing_key: signing_key(&auth.signing_key_env)?,
    })
}

fn signing_key(var: &str) -> anyhow::Result<Vec<u8>> {
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(key.into_bytes()),
        #[cfg(debug_assertions)]
        _ => {
            warn!("{var} not set, using the development signing key");
            Ok(DEV_SIGNING_KEY.as_bytes().to_vec())
        }
        #[cfg(not(debug_assertions))]
        _ => Err(anyhow::anyhow!("{var} must hold the JWT signing key")),
    }
}
