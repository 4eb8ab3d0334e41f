use crate::application_port::*;
use crate::domain_model::{FriendAction, RelationKind};
use serde::Serialize;
use std::convert::Infallible;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

use super::handler::ApiResponse;

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(error) = err.find::<ApiError>() {
        error.clone()
    } else if err.is_not_found() {
        ApiError::new(ApiErrorCode::NotFound, "no such route")
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        ApiError::new(ApiErrorCode::BadRequest, e.to_string())
    } else if err.find::<warp::reject::InvalidHeader>().is_some() {
        ApiError::new(ApiErrorCode::Unauthenticated, "malformed authorization header")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        ApiError::new(ApiErrorCode::BadRequest, "content-length required")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        ApiError::new(ApiErrorCode::BadRequest, "payload too large")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiError::new(ApiErrorCode::BadRequest, "method not allowed")
    } else {
        ApiError::new(ApiErrorCode::InternalError, format!("Unhandled error: {:?}", err))
    };

    let status = error.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<FriendAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RelationKind>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            action: None,
            state: None,
        }
    }

    fn rejected(code: ApiErrorCode, message: String, action: FriendAction, state: Option<RelationKind>) -> Self {
        ApiError {
            code,
            message,
            action: Some(action),
            state,
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiError {
        warn!("Internal error: {}", error);
        ApiError::new(ApiErrorCode::InternalError, "Internal error")
    }

    fn storage<E: std::fmt::Display>(error: E) -> ApiError {
        warn!("Storage failure: {}", error);
        ApiError::new(ApiErrorCode::StorageFailure, "Storage failure")
    }
}

impl reject::Reject for ApiError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    BadRequest,
    Unauthenticated,
    NotFound,
    NotRegistered,
    InvalidTarget,
    AlreadyExists,
    InvalidState,
    UsernameTaken,
    AlreadyRegistered,
    StorageFailure,
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFound | ApiErrorCode::NotRegistered => StatusCode::NOT_FOUND,
            ApiErrorCode::InvalidTarget => StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorCode::AlreadyExists
            | ApiErrorCode::InvalidState
            | ApiErrorCode::UsernameTaken
            | ApiErrorCode::AlreadyRegistered => StatusCode::CONFLICT,
            ApiErrorCode::StorageFailure => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        if error.is_unauthenticated() {
            ApiError::new(ApiErrorCode::Unauthenticated, error.to_string())
        } else {
            ApiError::internal(error)
        }
    }
}

impl From<RelationError> for ApiError {
    fn from(error: RelationError) -> Self {
        let message = error.to_string();
        match error {
            RelationError::UserNotFound(_) => ApiError::new(ApiErrorCode::NotFound, message),
            RelationError::InvalidTarget { action } => {
                ApiError::rejected(ApiErrorCode::InvalidTarget, message, action, None)
            }
            RelationError::AlreadyExists { action, state } => {
                ApiError::rejected(ApiErrorCode::AlreadyExists, message, action, Some(state))
            }
            RelationError::InvalidState { action, state } => {
                ApiError::rejected(ApiErrorCode::InvalidState, message, action, Some(state))
            }
            RelationError::Store(e) => ApiError::storage(e),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(error: ProfileError) -> Self {
        let message = error.to_string();
        match error {
            ProfileError::NotRegistered => ApiError::new(ApiErrorCode::NotRegistered, message),
            ProfileError::AlreadyRegistered => ApiError::new(ApiErrorCode::AlreadyRegistered, message),
            ProfileError::UsernameTaken => ApiError::new(ApiErrorCode::UsernameTaken, message),
            ProfileError::Store(e) => ApiError::storage(e),
        }
    }
}
