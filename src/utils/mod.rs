//! Utility functions and helpers.
//!
//! Environment variable lookup and basic identity field checks.

pub mod env;
mod email;

pub use env::get_env_with_prefix;
pub(crate) use email::is_valid_email;
