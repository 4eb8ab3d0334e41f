use crate::domain_model::{Profile, UserId, UserPair};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendshipStatus {
    Pending,
    Friends,
    Blocked,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Friends => "friends",
            FriendshipStatus::Blocked => "blocked",
        }
    }
}

impl FromStr for FriendshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendshipStatus::Pending),
            "friends" => Ok(FriendshipStatus::Friends),
            "blocked" => Ok(FriendshipStatus::Blocked),
            other => Err(format!("unknown friendship status: {other}")),
        }
    }
}

/// A stored relationship. Absence of a record means the pair are strangers.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Friendship {
    pub pair: UserPair,
    /// Who sent the pending request, who accepted it, or who blocked.
    pub initiator: UserId,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    pub fn state(&self) -> RelationState {
        match self.status {
            FriendshipStatus::Pending => RelationState::Pending {
                initiator: self.initiator.clone(),
            },
            FriendshipStatus::Friends => RelationState::Friends,
            FriendshipStatus::Blocked => RelationState::Blocked {
                by: self.initiator.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RelationState {
    None,
    Pending { initiator: UserId },
    Friends,
    Blocked { by: UserId },
}

impl RelationState {
    pub fn of(current: Option<&Friendship>) -> Self {
        current.map_or(RelationState::None, Friendship::state)
    }

    pub fn kind(&self) -> RelationKind {
        match self {
            RelationState::None => RelationKind::None,
            RelationState::Pending { .. } => RelationKind::Pending,
            RelationState::Friends => RelationKind::Friends,
            RelationState::Blocked { .. } => RelationKind::Blocked,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    None,
    Pending,
    Friends,
    Blocked,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationKind::None => "NONE",
            RelationKind::Pending => "PENDING",
            RelationKind::Friends => "FRIENDS",
            RelationKind::Blocked => "BLOCKED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendAction {
    SendRequest,
    AcceptRequest,
    DeclineRequest,
    CancelRequest,
    Unfriend,
    Block,
    Unblock,
}

impl fmt::Display for FriendAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FriendAction::SendRequest => "send friend request",
            FriendAction::AcceptRequest => "accept friend request",
            FriendAction::DeclineRequest => "decline friend request",
            FriendAction::CancelRequest => "cancel friend request",
            FriendAction::Unfriend => "unfriend",
            FriendAction::Block => "block",
            FriendAction::Unblock => "unblock",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendshipInfo {
    pub profile: Profile,
    pub friendship: Option<Friendship>,
}
