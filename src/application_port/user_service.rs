use crate::application_port::Actor;
use crate::domain_model::Profile;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("this user has to register")]
    NotRegistered,
    #[error("user already registered")]
    AlreadyRegistered,
    #[error("username taken")]
    UsernameTaken,
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub name: Option<String>,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn me(&self, actor: &Actor) -> Result<Profile, ProfileError>;
    async fn register(&self, actor: &Actor, input: RegisterInput) -> Result<Profile, ProfileError>;
    async fn username_exists(&self, username: &str) -> Result<bool, ProfileError>;
}
