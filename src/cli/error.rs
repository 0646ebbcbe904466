//! CLI error types and conversions

use crate::cache::CacheError;
use crate::dumper::DumpError;
use crate::fetcher::http::SessionError;
use crate::fetcher::FetcherError;
use crate::output::OutputError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Session error
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Cache error
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Dump error
    #[error("dump error: {0}")]
    Dump(#[from] DumpError),

    /// Output error
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
