use super::util::is_lost_race;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlConnection, MySqlPool, Row};

// A lost race for an absent row is retried against the winner's committed row.
const MAX_ATTEMPTS: usize = 5;

pub struct MySqlFriendshipStore {
    pool: MySqlPool,
}

impl MySqlFriendshipStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn decode_friendship(row: &MySqlRow) -> Result<Friendship, RelationError> {
    let decode = |e: sqlx::Error| RelationError::Store(format!("decode friendship: {e}"));

    let user_min: UserId = row.try_get("user_min").map_err(decode)?;
    let user_max: UserId = row.try_get("user_max").map_err(decode)?;
    let initiator: UserId = row.try_get("initiator").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    let pair = UserPair::try_new(user_min, user_max)
        .ok_or_else(|| RelationError::Store("self-pair row in friendship".to_string()))?;
    let status = status.parse::<FriendshipStatus>().map_err(RelationError::Store)?;

    Ok(Friendship {
        pair,
        initiator,
        status,
        created_at,
        updated_at,
    })
}

async fn insert_friendship(conn: &mut MySqlConnection, f: &Friendship) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
INSERT INTO friendship (user_min, user_max, initiator, status, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
    )
    .bind(f.pair.min())
    .bind(f.pair.max())
    .bind(&f.initiator)
    .bind(f.status.as_str())
    .bind(f.created_at)
    .bind(f.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn update_friendship(conn: &mut MySqlConnection, f: &Friendship) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
UPDATE friendship
SET initiator = ?, status = ?, created_at = ?, updated_at = ?
WHERE user_min = ? AND user_max = ?
"#,
    )
    .bind(&f.initiator)
    .bind(f.status.as_str())
    .bind(f.created_at)
    .bind(f.updated_at)
    .bind(f.pair.min())
    .bind(f.pair.max())
    .execute(conn)
    .await?;
    Ok(())
}

async fn delete_friendship(conn: &mut MySqlConnection, pair: &UserPair) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM friendship WHERE user_min = ? AND user_max = ?")
        .bind(pair.min())
        .bind(pair.max())
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait::async_trait]
impl FriendshipStore for MySqlFriendshipStore {
    async fn get(&self, pair: &UserPair) -> Result<Option<Friendship>, RelationError> {
        sqlx::query(
            r#"
SELECT user_min, user_max, initiator, status, created_at, updated_at
FROM friendship
WHERE user_min = ? AND user_max = ?
"#,
        )
        .bind(pair.min())
        .bind(pair.max())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RelationError::Store(format!("select friendship: {e}")))?
        .map(|row| decode_friendship(&row))
        .transpose()
    }

    async fn atomic_update(
        &self,
        pair: &UserPair,
        update: &FriendshipUpdate<'_>,
    ) -> Result<Option<Friendship>, RelationError> {
        for attempt in 1..=MAX_ATTEMPTS {
            // Dropping `tx` without commit rolls back, which also covers cancellation.
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| RelationError::Store(format!("begin: {e}")))?;

            let locked = sqlx::query(
                r#"
SELECT user_min, user_max, initiator, status, created_at, updated_at
FROM friendship
WHERE user_min = ? AND user_max = ?
FOR UPDATE
"#,
            )
            .bind(pair.min())
            .bind(pair.max())
            .fetch_optional(&mut *tx)
            .await;
            let current = match locked {
                Ok(row) => row.map(|row| decode_friendship(&row)).transpose()?,
                Err(e) if is_lost_race(&e) => {
                    tracing::debug!(%pair, attempt, "friendship lock lost a race, retrying");
                    continue;
                }
                Err(e) => return Err(RelationError::Store(format!("lock friendship: {e}"))),
            };

            let next = update(current.as_ref())?;

            let written = match (&current, &next) {
                (None, None) => Ok(()),
                (None, Some(created)) => insert_friendship(&mut *tx, created).await,
                (Some(_), Some(changed)) => update_friendship(&mut *tx, changed).await,
                (Some(_), None) => delete_friendship(&mut *tx, pair).await,
            };
            match written {
                Ok(()) => {}
                Err(e) if is_lost_race(&e) => {
                    tracing::debug!(%pair, attempt, "friendship write lost a race, retrying");
                    continue;
                }
                Err(e) => return Err(RelationError::Store(format!("write friendship: {e}"))),
            }

            tx.commit()
                .await
                .map_err(|e| RelationError::Store(format!("commit friendship: {e}")))?;
            return Ok(next);
        }

        Err(RelationError::Store(format!(
            "friendship {pair}: gave up after {MAX_ATTEMPTS} conflicting attempts"
        )))
    }
}
