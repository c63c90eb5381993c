use harvest_browser::{BrowserError, FetchError};
use harvest_db::DatabaseError;
use thiserror::Error;

/// Failures of a crawl, from a single page up to a whole job.
///
/// Page failures are contained by the site crawler and site failures by the
/// orchestrator; only `JobInit` fails a job.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("job could not start: {0}")]
    JobInit(String),

    #[error("site crawl failed: {0}")]
    SiteCrawl(String),

    #[error("page fetch failed: {0}")]
    PageFetch(#[from] FetchError),

    #[error("cancelled")]
    Cancelled,

    #[error("progress sink error: {0}")]
    Sink(String),

    #[error("job task aborted: {0}")]
    Aborted(String),
}

impl From<BrowserError> for CrawlError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::Launch(_) => Self::JobInit(err.to_string()),
            BrowserError::Context(_) => Self::SiteCrawl(err.to_string()),
        }
    }
}

impl From<DatabaseError> for CrawlError {
    fn from(err: DatabaseError) -> Self {
        Self::Sink(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
