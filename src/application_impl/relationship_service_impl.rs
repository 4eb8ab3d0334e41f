use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;

pub struct RealRelationshipService {
    profile_repo: Arc<dyn ProfileRepo>,
    friendship_store: Arc<dyn FriendshipStore>,
}

impl RealRelationshipService {
    pub fn new(profile_repo: Arc<dyn ProfileRepo>, friendship_store: Arc<dyn FriendshipStore>) -> Self {
        Self {
            profile_repo,
            friendship_store,
        }
    }

    async fn find_profile(&self, target: &UserLookup) -> Result<Profile, RelationError> {
        let profile = match target {
            UserLookup::Id(user_id) => self.profile_repo.get_by_id(user_id).await,
            UserLookup::Username(username) => self.profile_repo.get_by_username(username).await,
        };
        match profile {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(RelationError::UserNotFound(target.to_string())),
            Err(e) => Err(RelationError::Store(e.to_string())),
        }
    }

    async fn apply(
        &self,
        actor: &Actor,
        target: &UserId,
        action: FriendAction,
    ) -> Result<Option<Friendship>, RelationError> {
        let me = actor.user_id();
        let Some(pair) = UserPair::try_new(me.clone(), target.clone()) else {
            return Err(RelationError::InvalidTarget { action });
        };

        // only actions that create a record need the target to exist
        if matches!(action, FriendAction::SendRequest | FriendAction::Block) {
            self.find_profile(&UserLookup::Id(target.clone())).await?;
        }

        let now = Utc::now();
        let decide: &FriendshipUpdate<'_> = &|current| {
            transition(current, action, me, target, now).map_err(RelationError::from)
        };
        let next = self
            .friendship_store
            .atomic_update(&pair, decide)
            .await
            .inspect_err(|e| tracing::debug!(%pair, %action, "friendship transition rejected: {e}"))?;

        tracing::info!(
            %pair,
            %action,
            state = %RelationState::of(next.as_ref()).kind(),
            "friendship updated"
        );
        Ok(next)
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn get_friendship_info(
        &self,
        actor: &Actor,
        target: &UserLookup,
    ) -> Result<FriendshipInfo, RelationError> {
        let profile = self.find_profile(target).await?;
        let friendship = match UserPair::try_new(actor.user_id().clone(), profile.user_id.clone()) {
            Some(pair) => self.friendship_store.get(&pair).await?,
            None => None,
        };
        Ok(FriendshipInfo {
            profile,
            friendship,
        })
    }

    async fn send_friend_request(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError> {
        self.apply(actor, target, FriendAction::SendRequest).await
    }

    async fn accept_friend_request(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError> {
        self.apply(actor, target, FriendAction::AcceptRequest).await
    }

    async fn decline_friend_request(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError> {
        self.apply(actor, target, FriendAction::DeclineRequest).await
    }

    async fn cancel_friend_request(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError> {
        self.apply(actor, target, FriendAction::CancelRequest).await
    }

    async fn unfriend(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError> {
        self.apply(actor, target, FriendAction::Unfriend).await
    }

    async fn block_user(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError> {
        self.apply(actor, target, FriendAction::Block).await
    }

    async fn unblock_user(
        &self,
        actor: &Actor,
        target: &UserId,
    ) -> Result<Option<Friendship>, RelationError> {
        self.apply(actor, target, FriendAction::Unblock).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::{MemoryFriendshipStore, MemoryProfileRepo};
    use futures_util::future::join_all;

    fn uid(s: &str) -> UserId {
        UserId(s.to_owned())
    }

    fn actor(s: &str) -> Actor {
        Actor::authenticated(uid(s))
    }

    struct Fixture {
        service: Arc<RealRelationshipService>,
        store: Arc<MemoryFriendshipStore>,
    }

    async fn fixture(users: &[&str]) -> Fixture {
        let profiles = Arc::new(MemoryProfileRepo::new());
        for user in users {
            profiles
                .create(&Profile {
                    user_id: uid(user),
                    username: format!("{user}_name"),
                    name: None,
                    photo_url: None,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let store = Arc::new(MemoryFriendshipStore::new());
        let service = Arc::new(RealRelationshipService::new(profiles, store.clone()));
        Fixture { service, store }
    }

    async fn state_seen_by(service: &RealRelationshipService, me: &str, other: &str) -> RelationState {
        let info = service
            .get_friendship_info(&actor(me), &UserLookup::Id(uid(other)))
            .await
            .unwrap();
        RelationState::of(info.friendship.as_ref())
    }

    #[tokio::test]
    async fn self_request_is_invalid_target() {
        let f = fixture(&["x"]).await;
        let err = f.service.send_friend_request(&actor("x"), &uid("x")).await.unwrap_err();
        assert!(matches!(
            err,
            RelationError::InvalidTarget {
                action: FriendAction::SendRequest
            }
        ));
        assert_eq!(f.store.record_count().await, 0);
    }

    #[tokio::test]
    async fn request_to_unknown_user_is_not_found() {
        let f = fixture(&["x"]).await;
        let err = f.service.send_friend_request(&actor("x"), &uid("ghost")).await.unwrap_err();
        assert!(matches!(err, RelationError::UserNotFound(_)));
        assert_eq!(f.store.record_count().await, 0);
    }

    #[tokio::test]
    async fn pending_request_is_visible_from_both_sides() {
        let f = fixture(&["x", "y"]).await;
        let sent = f
            .service
            .send_friend_request(&actor("x"), &uid("y"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sent.status, FriendshipStatus::Pending);

        let expected = RelationState::Pending { initiator: uid("x") };
        assert_eq!(state_seen_by(&f.service, "x", "y").await, expected);
        assert_eq!(state_seen_by(&f.service, "y", "x").await, expected);
    }

    #[tokio::test]
    async fn friendship_info_by_username_reports_the_profile() {
        let f = fixture(&["x", "y"]).await;
        let info = f
            .service
            .get_friendship_info(&actor("x"), &UserLookup::Username("y_name".to_string()))
            .await
            .unwrap();
        assert_eq!(info.profile.user_id, uid("y"));
        assert!(info.friendship.is_none());

        let err = f
            .service
            .get_friendship_info(&actor("x"), &UserLookup::Username("nobody".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn accept_by_recipient_only() {
        let f = fixture(&["x", "y"]).await;
        f.service.send_friend_request(&actor("x"), &uid("y")).await.unwrap();

        let err = f.service.accept_friend_request(&actor("x"), &uid("y")).await.unwrap_err();
        assert!(matches!(
            err,
            RelationError::InvalidState {
                action: FriendAction::AcceptRequest,
                state: RelationKind::Pending
            }
        ));

        let accepted = f
            .service
            .accept_friend_request(&actor("y"), &uid("x"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accepted.status, FriendshipStatus::Friends);
        assert_eq!(state_seen_by(&f.service, "x", "y").await, RelationState::Friends);
        assert_eq!(state_seen_by(&f.service, "y", "x").await, RelationState::Friends);
    }

    #[tokio::test]
    async fn cancel_by_initiator_only() {
        let f = fixture(&["x", "y"]).await;
        f.service.send_friend_request(&actor("x"), &uid("y")).await.unwrap();

        let err = f.service.cancel_friend_request(&actor("y"), &uid("x")).await.unwrap_err();
        assert!(matches!(err, RelationError::InvalidState { .. }));

        let next = f.service.cancel_friend_request(&actor("x"), &uid("y")).await.unwrap();
        assert!(next.is_none());
        assert_eq!(f.store.record_count().await, 0);
    }

    #[tokio::test]
    async fn decline_by_recipient_only() {
        let f = fixture(&["x", "y"]).await;
        f.service.send_friend_request(&actor("x"), &uid("y")).await.unwrap();

        let err = f.service.decline_friend_request(&actor("x"), &uid("y")).await.unwrap_err();
        assert!(matches!(err, RelationError::InvalidState { .. }));

        let next = f.service.decline_friend_request(&actor("y"), &uid("x")).await.unwrap();
        assert!(next.is_none());
        assert_eq!(state_seen_by(&f.service, "x", "y").await, RelationState::None);
    }

    #[tokio::test]
    async fn unfriend_then_request_again_starts_fresh() {
        let f = fixture(&["x", "y"]).await;
        let first = f
            .service
            .send_friend_request(&actor("x"), &uid("y"))
            .await
            .unwrap()
            .unwrap();
        f.service.accept_friend_request(&actor("y"), &uid("x")).await.unwrap();

        assert!(f.service.unfriend(&actor("y"), &uid("x")).await.unwrap().is_none());
        assert_eq!(f.store.record_count().await, 0);
        let err = f.service.unfriend(&actor("x"), &uid("y")).await.unwrap_err();
        assert!(matches!(
            err,
            RelationError::InvalidState {
                action: FriendAction::Unfriend,
                state: RelationKind::None
            }
        ));

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let again = f
            .service
            .send_friend_request(&actor("y"), &uid("x"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.initiator, uid("y"));
        assert_eq!(again.status, FriendshipStatus::Pending);
        assert!(again.created_at > first.created_at);
    }

    #[tokio::test]
    async fn duplicate_request_already_exists() {
        let f = fixture(&["x", "y"]).await;
        f.service.send_friend_request(&actor("x"), &uid("y")).await.unwrap();
        let err = f.service.send_friend_request(&actor("y"), &uid("x")).await.unwrap_err();
        assert!(matches!(
            err,
            RelationError::AlreadyExists {
                action: FriendAction::SendRequest,
                state: RelationKind::Pending
            }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_requests_yield_one_pending_record() {
        let f = fixture(&["x", "y"]).await;
        let attempts = (0..2).map(|_| {
            let service = f.service.clone();
            tokio::spawn(async move { service.send_friend_request(&actor("x"), &uid("y")).await })
        });
        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(RelationError::AlreadyExists { .. })))
                .count(),
            1
        );
        assert_eq!(f.store.record_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn disjoint_pairs_do_not_interfere() {
        let users: Vec<String> = (0..20).map(|i| format!("u{i}")).collect();
        let refs: Vec<&str> = users.iter().map(String::as_str).collect();
        let f = fixture(&refs).await;

        let attempts = (0..10).map(|i| {
            let service = f.service.clone();
            let (from, to) = (format!("u{}", 2 * i), format!("u{}", 2 * i + 1));
            tokio::spawn(async move {
                service.send_friend_request(&actor(&from), &uid(&to)).await?;
                service.accept_friend_request(&actor(&to), &uid(&from)).await
            })
        });
        for joined in join_all(attempts).await {
            let friendship = joined.unwrap().unwrap().unwrap();
            assert_eq!(friendship.status, FriendshipStatus::Friends);
        }
        assert_eq!(f.store.record_count().await, 10);
    }

    #[tokio::test]
    async fn block_ends_a_friendship_and_stops_new_requests() {
        let f = fixture(&["x", "y"]).await;
        f.service.send_friend_request(&actor("x"), &uid("y")).await.unwrap();
        f.service.accept_friend_request(&actor("y"), &uid("x")).await.unwrap();

        let blocked = f
            .service
            .block_user(&actor("y"), &uid("x"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(blocked.status, FriendshipStatus::Blocked);
        assert_eq!(f.store.record_count().await, 1);

        let expected = RelationState::Blocked { by: uid("y") };
        assert_eq!(state_seen_by(&f.service, "x", "y").await, expected);
        assert_eq!(state_seen_by(&f.service, "y", "x").await, expected);

        for result in [
            f.service.send_friend_request(&actor("x"), &uid("y")).await,
            f.service.send_friend_request(&actor("y"), &uid("x")).await,
            f.service.unfriend(&actor("x"), &uid("y")).await,
            f.service.unblock_user(&actor("x"), &uid("y")).await,
        ] {
            assert!(matches!(
                result,
                Err(RelationError::InvalidState {
                    state: RelationKind::Blocked,
                    ..
                })
            ));
        }

        assert!(f.service.unblock_user(&actor("y"), &uid("x")).await.unwrap().is_none());
        assert_eq!(f.store.record_count().await, 0);
        f.service.send_friend_request(&actor("x"), &uid("y")).await.unwrap();
    }

    #[tokio::test]
    async fn blocking_an_unknown_user_is_not_found() {
        let f = fixture(&["x"]).await;
        let err = f.service.block_user(&actor("x"), &uid("ghost")).await.unwrap_err();
        assert!(matches!(err, RelationError::UserNotFound(_)));
        assert_eq!(f.store.record_count().await, 0);
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl FriendshipStore for BrokenStore {
        async fn get(&self, _pair: &UserPair) -> Result<Option<Friendship>, RelationError> {
            Err(RelationError::Store("connection refused".to_string()))
        }

        async fn atomic_update(
            &self,
            _pair: &UserPair,
            _update: &FriendshipUpdate<'_>,
        ) -> Result<Option<Friendship>, RelationError> {
            Err(RelationError::Store("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn storage_failures_surface_unchanged() {
        let profiles = Arc::new(MemoryProfileRepo::new());
        for user in ["x", "y"] {
            profiles
                .create(&Profile {
                    user_id: uid(user),
                    username: user.to_string(),
                    name: None,
                    photo_url: None,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let service = RealRelationshipService::new(profiles, Arc::new(BrokenStore));

        let err = service.send_friend_request(&actor("x"), &uid("y")).await.unwrap_err();
        assert!(matches!(err, RelationError::Store(_)));
        let err = service
            .get_friendship_info(&actor("x"), &UserLookup::Id(uid("y")))
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::Store(_)));
    }
}
