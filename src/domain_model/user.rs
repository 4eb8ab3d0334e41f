use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user id must not be empty")]
pub struct EmptyUserId;

impl std::str::FromStr for UserId {
    type Err = EmptyUserId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmptyUserId);
        }
        Ok(UserId(s.to_owned()))
    }
}

/// Order-independent key for the relationship between two distinct users.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct UserPair(UserId, UserId);

impl UserPair {
    /// Returns `None` for a self-pair.
    pub fn try_new(a: UserId, b: UserId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self(a, b)),
            std::cmp::Ordering::Greater => Some(Self(b, a)),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn min(&self) -> &UserId {
        &self.0
    }

    pub fn max(&self) -> &UserId {
        &self.1
    }
}

impl fmt::Display for UserPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub user_id: UserId,
    pub username: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// How a caller names another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(UserId),
    Username(String),
}

impl fmt::Display for UserLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserLookup::Id(id) => write!(f, "id={id}"),
            UserLookup::Username(username) => write!(f, "username={username}"),
        }
    }
}
