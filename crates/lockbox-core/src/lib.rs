//! lockbox-core - Shared functionality for the lockbox credential store
//!
//! Standard locations, the user configuration file and a few display
//! helpers used by the CLI.

pub mod config;
pub mod format;
pub mod paths;

pub use config::Config;
pub use paths::Paths;
