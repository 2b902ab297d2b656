use std::time::Duration;

use thiserror::Error;

/// Prefix of every failure rendered into the transcript
pub const ERROR_PREFIX: &str = "Sorry, something went wrong";

/// Errors produced by a single exchange with the chat endpoint
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("could not reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("server returned HTTP {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status {
        status: reqwest::StatusCode,
        detail: Option<String>,
    },

    #[error("could not parse reply: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint '{0}': expected an http:// or https:// URL")]
    InvalidEndpoint(String),

    /// Raised by fake transports in tests and by callers that abort an exchange
    #[error("{0}")]
    Other(String),
}

impl ChatError {
    /// The fixed human-readable line shown in the transcript for this failure
    pub fn user_message(&self) -> String {
        format!("{ERROR_PREFIX}: {self}")
    }
}
