use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_by_id(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>, ProfileError>;

    /// Fails with `AlreadyRegistered` or `UsernameTaken` on a conflicting row.
    async fn create(&self, profile: &Profile) -> Result<(), ProfileError>;

    async fn username_exists(&self, username: &str) -> Result<bool, ProfileError>;
}
