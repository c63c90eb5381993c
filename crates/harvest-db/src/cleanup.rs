//! Retention: removal of expired jobs.

use crate::error::Result;
use harvest_core::Timestamp;
use sqlx::{Pool, Sqlite};

/// Delete jobs created before `cutoff`, along with their progress rows.
///
/// Returns the number of jobs removed.
pub async fn delete_jobs_older_than(pool: &Pool<Sqlite>, cutoff: Timestamp) -> Result<u64> {
    let result = sqlx::query("DELETE FROM jobs WHERE created_at < ?")
        .bind(cutoff.to_rfc3339())
        .execute(pool)
        .await?;

    let removed = result.rows_affected();
    if removed > 0 {
        tracing::info!("Deleted {} jobs created before {}", removed, cutoff);
    }
    Ok(removed)
}
