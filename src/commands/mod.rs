//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod discover;
pub mod utils;

// Re-export main command functions
pub use discover::{build_parameters, execute_discover, validate_args, DiscoverArgs};
pub use utils::{display_version, validate_log_file};
