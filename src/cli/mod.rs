//! CLI command implementations

pub mod dump;
pub mod error;

pub use dump::{Cli, Commands};
pub use error::CliError;
