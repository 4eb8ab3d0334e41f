use super::handler;
use crate::application_impl::AuthGate;
use crate::application_port::RelationshipService;
use crate::domain_model::FriendAction;
use crate::server::*;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use warp::hyper::body::Bytes;
use warp::{Filter, http};

const MAX_BODY_BYTES: u64 = 16 * 1024;

// Each handler passes the credential to `AuthGate::guard` before decoding
// anything else from the request.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let friendship_info = warp::get()
        .and(warp::path("friendship_info"))
        .and(warp::path::end())
        .and(with_authorization())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_gate(server.auth_gate.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::get_friendship_info);

    let send = friend_action("send_friend_request", FriendAction::SendRequest, server.clone());
    let accept = friend_action("accept_friend_request", FriendAction::AcceptRequest, server.clone());
    let decline = friend_action("decline_friend_request", FriendAction::DeclineRequest, server.clone());
    let cancel = friend_action("cancel_friend_request", FriendAction::CancelRequest, server.clone());
    let unfriend = friend_action("unfriend", FriendAction::Unfriend, server.clone());
    let block = friend_action("block_user", FriendAction::Block, server.clone());
    let unblock = friend_action("unblock_user", FriendAction::Unblock, server.clone());

    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_authorization())
        .and(with_gate(server.auth_gate.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::me);

    let register = warp::post()
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(with_authorization())
        .and(with_body())
        .and(with_gate(server.auth_gate.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::register);

    let username_exists = warp::get()
        .and(warp::path("username_exists"))
        .and(warp::path::end())
        .and(with_authorization())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_gate(server.auth_gate.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::username_exists);

    friendship_info
        .or(send)
        .or(accept)
        .or(decline)
        .or(cancel)
        .or(unfriend)
        .or(block)
        .or(unblock)
        .or(me)
        .or(register)
        .or(username_exists)
}

fn friend_action(
    name: &'static str,
    action: FriendAction,
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::post()
        .and(warp::path(name))
        .and(warp::path::end())
        .and(with_authorization())
        .and(with_body())
        .and(with_gate(server.auth_gate.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(
            move |authorization: Option<String>,
                  body: Bytes,
                  auth_gate: AuthGate,
                  relationship_service: Arc<dyn RelationshipService>| {
                handler::friend_action(action, authorization, body, auth_gate, relationship_service)
            },
        )
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_gate(
    auth_gate: AuthGate,
) -> impl Filter<Extract = (AuthGate,), Error = Infallible> + Clone {
    warp::any().map(move || auth_gate.clone())
}

// A missing header still reaches the gate so it is reported as unauthenticated.
fn with_authorization()
-> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_ref())
}

// Raw bytes; the handler decodes them once the caller is authenticated.
fn with_body() -> impl Filter<Extract = (Bytes,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::bytes())
}
