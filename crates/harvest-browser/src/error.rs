use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Engine-level failures: the browser or a browsing context is unusable.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("browsing context unavailable: {0}")]
    Context(String),
}

/// A single page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("could not read content of {url}: {reason}")]
    Content { url: String, reason: String },
}

impl FetchError {
    /// URL the failed fetch was aimed at.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Navigation { url, .. } | Self::Timeout { url, .. } | Self::Content { url, .. } => {
                url
            }
        }
    }
}

/// A screenshot could not be taken or stored.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("screenshot failed: {0}")]
    Capture(String),

    #[error("could not store screenshot: {0}")]
    Io(#[from] std::io::Error),
}
