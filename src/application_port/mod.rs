mod auth_service;
mod relationship_service;
mod user_service;

pub use auth_service::*;
pub use relationship_service::*;
pub use user_service::*;
