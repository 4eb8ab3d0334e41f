mod friendship_store_mysql;
mod profile_repo_mysql;

pub use friendship_store_mysql::*;
pub use profile_repo_mysql::*;

mod util;
