use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Default)]
pub struct MemoryProfileRepo {
    profiles: DashMap<UserId, Profile>,
    usernames: DashMap<String, UserId>,
}

impl MemoryProfileRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProfileRepo for MemoryProfileRepo {
    async fn get_by_id(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileError> {
        Ok(self.profiles.get(user_id).map(|e| e.value().clone()))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>, ProfileError> {
        let user_id = self.usernames.get(username).map(|e| e.value().clone());
        match user_id {
            Some(user_id) => self.get_by_id(&user_id).await,
            None => Ok(None),
        }
    }

    async fn create(&self, profile: &Profile) -> Result<(), ProfileError> {
        // lock order: profiles -> usernames
        match self.profiles.entry(profile.user_id.clone()) {
            Entry::Occupied(_) => Err(ProfileError::AlreadyRegistered),
            Entry::Vacant(by_id) => match self.usernames.entry(profile.username.clone()) {
                Entry::Occupied(_) => Err(ProfileError::UsernameTaken),
                Entry::Vacant(by_name) => {
                    by_name.insert(profile.user_id.clone());
                    by_id.insert(profile.clone());
                    Ok(())
                }
            },
        }
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ProfileError> {
        Ok(self.usernames.contains_key(username))
    }
}
