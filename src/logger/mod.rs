//! Tracing setup shared by the server and the helper binaries.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
