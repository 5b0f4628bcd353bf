use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    /// The provider answered with a non-success `status`; carries the
    /// provider's own message (e.g. "No transactions found", rate limits).
    #[error("explorer API error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode explorer response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WhitelistError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The contract source has no `_whitelist()` section. Absence of data,
    /// not a parse crash; callers decide whether an empty whitelist is fine.
    #[error("could not find the _whitelist() section in the contract source")]
    WhitelistSectionNotFound,
}
