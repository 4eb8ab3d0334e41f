use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

type Slot = Arc<Mutex<Option<Friendship>>>;

/// Lock table keyed by pair. Each slot owns the record of its pair, so the
/// read-decide-write of an update happens under one lock and with no await
/// between the decision and the write.
#[derive(Default)]
pub struct MemoryFriendshipStore {
    slots: DashMap<UserPair, Slot>,
}

impl MemoryFriendshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[cfg(test)]
    pub(crate) async fn record_count(&self) -> usize {
        let slots: Vec<Slot> = self.slots.iter().map(|e| e.value().clone()).collect();
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    fn slot(&self, pair: &UserPair) -> Slot {
        self.slots
            .entry(pair.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .value()
            .clone()
    }

    // Drops the slot of an empty pair nobody else is holding.
    fn prune(&self, pair: &UserPair) {
        self.slots.remove_if(pair, |_, slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|record| record.is_none())
        });
    }
}

#[async_trait::async_trait]
impl FriendshipStore for MemoryFriendshipStore {
    async fn get(&self, pair: &UserPair) -> Result<Option<Friendship>, RelationError> {
        let slot = self.slots.get(pair).map(|e| e.value().clone());
        match slot {
            Some(slot) => Ok(slot.lock().await.clone()),
            None => Ok(None),
        }
    }

    async fn atomic_update(
        &self,
        pair: &UserPair,
        update: &FriendshipUpdate<'_>,
    ) -> Result<Option<Friendship>, RelationError> {
        let slot = self.slot(pair);
        let result = {
            let mut record = slot.lock().await;
            update(record.as_ref()).inspect(|next| *record = next.clone())
        };
        drop(slot);
        self.prune(pair);
        result
    }
}
