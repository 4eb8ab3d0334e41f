//! Pure friendship transitions.
//!
//! `transition` decides the next stored record (or its removal) from the
//! current one. It performs no I/O; serialization of concurrent callers is the
//! store's job.

use crate::domain_model::{
    FriendAction, Friendship, FriendshipStatus, RelationKind, RelationState, UserId, UserPair,
};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
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
}

/// `Ok(None)` means the record must be deleted (or stay absent).
pub fn transition(
    current: Option<&Friendship>,
    action: FriendAction,
    actor: &UserId,
    target: &UserId,
    now: DateTime<Utc>,
) -> Result<Option<Friendship>, TransitionError> {
    let Some(pair) = UserPair::try_new(actor.clone(), target.clone()) else {
        return Err(TransitionError::InvalidTarget { action });
    };
    debug_assert!(current.is_none_or(|f| f.pair == pair));

    let state = RelationState::of(current);
    let invalid = |state: &RelationState| TransitionError::InvalidState {
        action,
        state: state.kind(),
    };

    match (action, &state) {
        (FriendAction::SendRequest, RelationState::Blocked { .. }) => Err(invalid(&state)),
        (FriendAction::SendRequest, RelationState::None) => Ok(Some(Friendship {
            pair,
            initiator: actor.clone(),
            status: FriendshipStatus::Pending,
            created_at: now,
            updated_at: now,
        })),
        (FriendAction::SendRequest, _) => Err(TransitionError::AlreadyExists {
            action,
            state: state.kind(),
        }),

        (FriendAction::AcceptRequest, RelationState::Pending { initiator }) if initiator == target => {
            let created_at = current.map_or(now, |f| f.created_at);
            Ok(Some(Friendship {
                pair,
                initiator: actor.clone(),
                status: FriendshipStatus::Friends,
                created_at,
                updated_at: now,
            }))
        }
        (FriendAction::DeclineRequest, RelationState::Pending { initiator }) if initiator == target => {
            Ok(None)
        }
        (FriendAction::CancelRequest, RelationState::Pending { initiator }) if initiator == actor => {
            Ok(None)
        }
        (FriendAction::Unfriend, RelationState::Friends) => Ok(None),

        // A block replaces any pending request or friendship.
        (FriendAction::Block, RelationState::Blocked { by }) if by == actor => {
            Err(TransitionError::AlreadyExists {
                action,
                state: state.kind(),
            })
        }
        (FriendAction::Block, RelationState::Blocked { .. }) => Err(invalid(&state)),
        (FriendAction::Block, _) => Ok(Some(Friendship {
            pair,
            initiator: actor.clone(),
            status: FriendshipStatus::Blocked,
            created_at: now,
            updated_at: now,
        })),
        (FriendAction::Unblock, RelationState::Blocked { by }) if by == actor => Ok(None),

        (FriendAction::AcceptRequest, _)
        | (FriendAction::DeclineRequest, _)
        | (FriendAction::CancelRequest, _)
        | (FriendAction::Unfriend, _)
        | (FriendAction::Unblock, _) => Err(invalid(&state)),
    }
}
