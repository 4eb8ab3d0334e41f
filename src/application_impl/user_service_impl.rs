use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::ProfileRepo;
use chrono::Utc;
use std::sync::Arc;

pub struct RealUserService {
    profile_repo: Arc<dyn ProfileRepo>,
}

impl RealUserService {
    pub fn new(profile_repo: Arc<dyn ProfileRepo>) -> RealUserService {
        RealUserService { profile_repo }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn me(&self, actor: &Actor) -> Result<Profile, ProfileError> {
        self.profile_repo
            .get_by_id(actor.user_id())
            .await?
            .ok_or(ProfileError::NotRegistered)
    }

    async fn register(&self, actor: &Actor, input: RegisterInput) -> Result<Profile, ProfileError> {
        let RegisterInput { username, name } = input;
        let profile = Profile {
            user_id: actor.user_id().clone(),
            username,
            name: name.filter(|n| !n.trim().is_empty()),
            photo_url: None,
            created_at: Utc::now(),
        };
        self.profile_repo.create(&profile).await?;
        tracing::info!(user_id = %profile.user_id, username = %profile.username, "user registered");
        Ok(profile)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ProfileError> {
        self.profile_repo.username_exists(username).await
    }
}
