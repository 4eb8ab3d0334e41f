use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlProfileRepo {
    pool: MySqlPool,
}

impl MySqlProfileRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlProfileRepo { pool }
    }
}

fn decode_profile(row: &MySqlRow) -> Result<Profile, ProfileError> {
    let decode = |e: sqlx::Error| ProfileError::Store(format!("decode profile: {e}"));
    Ok(Profile {
        user_id: row.try_get("user_id").map_err(decode)?,
        username: row.try_get("username").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        photo_url: row.try_get("photo_url").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

#[async_trait::async_trait]
impl ProfileRepo for MySqlProfileRepo {
    async fn get_by_id(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileError> {
        sqlx::query(
            "SELECT user_id, username, name, photo_url, created_at FROM profile WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProfileError::Store(format!("query profile by id: {e}")))?
        .map(|row| decode_profile(&row))
        .transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>, ProfileError> {
        sqlx::query(
            "SELECT user_id, username, name, photo_url, created_at FROM profile WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProfileError::Store(format!("query profile by username: {e}")))?
        .map(|row| decode_profile(&row))
        .transpose()
    }

    async fn create(&self, profile: &Profile) -> Result<(), ProfileError> {
        let res = sqlx::query(
            r#"
INSERT INTO profile (user_id, username, name, photo_url, created_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(&profile.user_id)
        .bind(&profile.username)
        .bind(&profile.name)
        .bind(&profile.photo_url)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_dup_key(&e) => {
                // either key may have collided
                if self.get_by_id(&profile.user_id).await?.is_some() {
                    Err(ProfileError::AlreadyRegistered)
                } else {
                    Err(ProfileError::UsernameTaken)
                }
            }
            Err(e) => Err(ProfileError::Store(format!("insert profile: {e}"))),
        }
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ProfileError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM profile WHERE username = ?"#)
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ProfileError::Store(e.to_string()))?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::util::test_db;
    use super::*;
    use chrono::Utc;

    fn profile(user_id: &str, username: &str) -> Profile {
        Profile {
            user_id: UserId(user_id.to_string()),
            username: username.to_string(),
            name: None,
            photo_url: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_keys_split_into_registration_errors() {
        let Some(pool) = test_db::pool().await else { return };
        let repo = MySqlProfileRepo::new(pool);
        let (id, username) = (test_db::unique("id-"), test_db::unique("u"));

        repo.create(&profile(&id, &username)).await.unwrap();
        assert!(repo.username_exists(&username).await.unwrap());

        let again = repo.create(&profile(&id, &test_db::unique("u"))).await;
        assert!(matches!(again, Err(ProfileError::AlreadyRegistered)));

        let taken = repo.create(&profile(&test_db::unique("id-"), &username)).await;
        assert!(matches!(taken, Err(ProfileError::UsernameTaken)));

        let stored = repo.get_by_username(&username).await.unwrap().unwrap();
        assert_eq!(stored.user_id, UserId(id));
    }
}
