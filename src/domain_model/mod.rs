mod friend;
mod friend_transition;
mod user;

pub use friend::*;
pub use friend_transition::*;
pub use user::*;
