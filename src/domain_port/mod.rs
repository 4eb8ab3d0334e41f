mod friendship_repo;
mod profile_repo;

pub use friendship_repo::*;
pub use profile_repo::*;
