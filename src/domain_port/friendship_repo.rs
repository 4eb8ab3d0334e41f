use crate::application_port::*;
use crate::domain_model::*;

/// Decides the next record for a pair from the current one. May be invoked
/// more than once per `atomic_update` by stores that retry on conflict, so it
/// must be free of side effects.
pub type FriendshipUpdate<'a> =
    dyn Fn(Option<&Friendship>) -> Result<Option<Friendship>, RelationError> + Send + Sync + 'a;

#[async_trait::async_trait]
pub trait FriendshipStore: Send + Sync {
    /// Snapshot of the pair's record, outside of any update.
    async fn get(&self, pair: &UserPair) -> Result<Option<Friendship>, RelationError>;

    /// Runs `update` against the current record and persists its result:
    /// `Some` is written, `None` deletes the record. Calls for the same pair
    /// never interleave. When `update` fails nothing is written and the error
    /// is returned as is.
    async fn atomic_update(
        &self,
        pair: &UserPair,
        update: &FriendshipUpdate<'_>,
    ) -> Result<Option<Friendship>, RelationError>;
}
