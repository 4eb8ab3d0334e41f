mod friendship_store_memory;
mod profile_repo_memory;

pub use friendship_store_memory::*;
pub use profile_repo_memory::*;
