//! Error kinds for the linker session core.
//!
//! None of these terminate the process. The worst outcome of any of them is a
//! return to the `Disconnected` panel state.

use thiserror::Error;

/// Message shown when the active page is not a GitHub issue or pull request.
pub const INELIGIBLE_PAGE_GUIDANCE: &str =
    "This extension only works on GitHub PR and Issue pages, please navigate to one to use it.";

#[derive(Debug, Error)]
pub enum LinkerError {
    /// The page address does not match the GitHub issue/PR pattern.
    #[error("{}", INELIGIBLE_PAGE_GUIDANCE)]
    IneligiblePage(String),

    /// Connecting failed, or the channel was lost. Requires an explicit retry.
    #[error("Failed to connect: {0}")]
    ChannelUnavailable(String),

    /// The service reported that nothing clears any threshold.
    #[error("{0}")]
    EmptyResultBenign(String),

    /// Empty suggestions without the benign marker. Re-requested once.
    #[error("no suggestions returned: {0}")]
    EmptyResultTransient(String),

    /// A durable-store value could not be parsed and was discarded.
    #[error("discarded malformed persisted value for '{key}': {reason}")]
    MalformedPersistedState { key: &'static str, reason: String },

    /// An inbound frame did not match any known response shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state store error: {0}")]
    Store(#[from] tokio_rusqlite::Error),
}

pub type LinkerResult<T> = Result<T, LinkerError>;
