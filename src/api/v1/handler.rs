use super::error::*;
use crate::application_impl::AuthGate;
use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use warp::hyper::body::Bytes;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// The relationship between the caller and `user_id`, identical in `state`
/// and `initiator` whichever side asks.
#[derive(Debug, Serialize)]
pub struct FriendshipView {
    pub user_id: UserId,
    pub state: RelationKind,
    pub initiator: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FriendshipView {
    fn new(target: UserId, friendship: Option<&Friendship>) -> Self {
        FriendshipView {
            user_id: target,
            state: RelationState::of(friendship).kind(),
            initiator: friendship.map(|f| f.initiator.clone()),
            created_at: friendship.map(|f| f.created_at),
            updated_at: friendship.map(|f| f.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FriendshipInfoResponse {
    pub profile: Profile,
    pub friendship: FriendshipView,
}

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: Option<String>,
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::new(ApiErrorCode::BadRequest, message)
}

// Bodies and query strings are decoded behind the gate, so a bad credential
// is reported before a malformed request.
fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| bad_request(format!("Request body deserialize error: {e}")))
}

fn lookup_from(params: &HashMap<String, String>) -> Result<UserLookup, ApiError> {
    match (params.get("user_id"), params.get("username")) {
        (Some(user_id), None) => user_id
            .parse::<UserId>()
            .map(UserLookup::Id)
            .map_err(|e| bad_request(e.to_string())),
        (None, Some(username)) => Ok(UserLookup::Username(username.clone())),
        _ => Err(bad_request("exactly one of user_id or username is required")),
    }
}

pub async fn get_friendship_info(
    authorization: Option<String>,
    params: HashMap<String, String>,
    auth_gate: AuthGate,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let response = auth_gate
        .guard(authorization.as_deref(), move |actor| {
            friendship_info(actor, params, relationship_service)
        })
        .await
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

async fn friendship_info(
    actor: Actor,
    params: HashMap<String, String>,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<FriendshipInfoResponse, ApiError> {
    let lookup = lookup_from(&params)?;
    let info = relationship_service.get_friendship_info(&actor, &lookup).await?;

    let friendship = FriendshipView::new(info.profile.user_id.clone(), info.friendship.as_ref());
    Ok(FriendshipInfoResponse {
        profile: info.profile,
        friendship,
    })
}

pub async fn friend_action(
    action: FriendAction,
    authorization: Option<String>,
    body: Bytes,
    auth_gate: AuthGate,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let view = auth_gate
        .guard(authorization.as_deref(), move |actor| {
            apply_action(actor, action, body, relationship_service)
        })
        .await
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(view)))
}

async fn apply_action(
    actor: Actor,
    action: FriendAction,
    body: Bytes,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<FriendshipView, ApiError> {
    let TargetRequest { user_id: target } = decode_json(&body)?;
    let friendship = match action {
        FriendAction::SendRequest => relationship_service.send_friend_request(&actor, &target).await,
        FriendAction::AcceptRequest => relationship_service.accept_friend_request(&actor, &target).await,
        FriendAction::DeclineRequest => relationship_service.decline_friend_request(&actor, &target).await,
        FriendAction::CancelRequest => relationship_service.cancel_friend_request(&actor, &target).await,
        FriendAction::Unfriend => relationship_service.unfriend(&actor, &target).await,
        FriendAction::Block => relationship_service.block_user(&actor, &target).await,
        FriendAction::Unblock => relationship_service.unblock_user(&actor, &target).await,
    }?;
    Ok(FriendshipView::new(target, friendship.as_ref()))
}

pub async fn me(
    authorization: Option<String>,
    auth_gate: AuthGate,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = auth_gate
        .guard(authorization.as_deref(), move |actor| async move {
            user_service.me(&actor).await.map_err(ApiError::from)
        })
        .await
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}

pub async fn register(
    authorization: Option<String>,
    body: Bytes,
    auth_gate: AuthGate,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = auth_gate
        .guard(authorization.as_deref(), move |actor| {
            register_profile(actor, body, user_service)
        })
        .await
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}

async fn register_profile(
    actor: Actor,
    body: Bytes,
    user_service: Arc<dyn UserService>,
) -> Result<Profile, ApiError> {
    let RegisterRequest { username, name } = decode_json(&body)?;
    let profile = user_service
        .register(&actor, RegisterInput { username, name })
        .await?;
    Ok(profile)
}

pub async fn username_exists(
    authorization: Option<String>,
    params: HashMap<String, String>,
    auth_gate: AuthGate,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let exists = auth_gate
        .guard(authorization.as_deref(), move |_actor| async move {
            let username = params
                .get("username")
                .ok_or_else(|| bad_request("username is required"))?;
            user_service
                .username_exists(username)
                .await
                .map_err(ApiError::from)
        })
        .await
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(exists)))
}
