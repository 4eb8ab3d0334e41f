use crate::application_port::Actor;
use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("cannot {action} with yourself")]
    InvalidTarget { action: FriendAction },
    #[error("cannot {action}: relationship is already {state}")]
    AlreadyExists {
        action: FriendAction,
        state: RelationKind,
    },
    #[error("cannot {action} while relationship is {state}")]
    InvalidState {
        action: FriendAction,
        state: RelationKind,
    },
    #[error("store error: {0}")]
    Store(String),
}

impl From<TransitionError> for RelationError {
    fn from(error: TransitionError) -> Self {
        match error {
            TransitionError::InvalidTarget { action } => RelationError::InvalidTarget { action },
            TransitionError::AlreadyExists { action, state } => {
                RelationError::AlreadyExists { action, state }
            }
            TransitionError::InvalidState { action, state } => {
                RelationError::InvalidState { action, state }
            }
        }
    }
}

/// Friendship operations. A returned `None` means the pair no longer has a
/// record.
///
/// Every operation takes an [`Actor`], which only the authorization gate can
/// produce.
#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    async fn get_friendship_info(
        &self,
        actor: &Actor,
        target: &UserLookup,
    ) -> Result<FriendshipInfo, RelationError>;
    async fn send_friend_request(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError>;
    async fn accept_friend_request(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError>;
    async fn decline_friend_request(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError>;
    async fn cancel_friend_request(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError>;
    async fn unfriend(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError>;
    async fn block_user(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError>;
    async fn unblock_user(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError>;
}
