//! Database error types.

use harvest_core::{HarvestError, JobId};
use thiserror::Error;

/// Errors from the job and page-visit store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database file or pool could not be opened.
    #[error("failed to open database: {0}")]
    Open(String),

    /// Embedded migrations could not be applied.
    #[error("migration failed: {0}")]
    Migration(String),

    /// An update targeted a job that does not exist.
    #[error("job '{0}' not found")]
    JobNotFound(JobId),

    /// A stored column holds a value the data model rejects.
    #[error("corrupt row: {0}")]
    Decode(#[from] HarvestError),

    /// A JSON column (seed URLs, results) could not be encoded or decoded.
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DatabaseError> for HarvestError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Decode(inner) => inner,
            other => Self::Database(other.to_string()),
        }
    }
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_not_found_names_job() {
        let id = JobId::generate();
        let err = DatabaseError::JobNotFound(id.clone());
        assert_eq!(err.to_string(), format!("job '{id}' not found"));
    }

    #[test]
    fn test_decode_error_unwraps_into_core() {
        let core = "bogus".parse::<harvest_core::JobStatus>().unwrap_err();
        let err: HarvestError = DatabaseError::from(core).into();
        assert!(matches!(err, HarvestError::UnknownStatus { kind: "job", .. }));
    }
}
