//! Error types for the rewriters.

use std::path::PathBuf;

use localsite_generator::discovery::DiscoveryError;
use thiserror::Error;

/// Result type alias using `RewriteError`.
pub type Result<T> = std::result::Result<T, RewriteError>;

/// Rewrite errors.
#[derive(Error, Debug)]
pub enum RewriteError {
    /// A page lacks markup a rewriter depends on.
    #[error("{page}: could not find {what}")]
    MissingMarkup { page: String, what: String },

    /// A city page has no configured lede.
    #[error("no lede configured for city '{slug}'")]
    MissingLede { slug: String },

    /// Reading a page failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A page is not valid UTF-8.
    #[error("{path} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Writing a page failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pattern built from configuration did not compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Page discovery error.
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl RewriteError {
    /// Create a missing-markup error for a page.
    pub fn missing(page: impl Into<String>, what: impl Into<String>) -> Self {
        Self::MissingMarkup {
            page: page.into(),
            what: what.into(),
        }
    }
}
