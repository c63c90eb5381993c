//! Per-URL progress rows.
//!
//! Rows are keyed by `(job_id, url)`. Writing the same key again replaces the
//! status and message, so repeated reports for a page converge on the latest.

use crate::error::Result;
use harvest_core::{JobId, PageStatus, PageVisit, Timestamp};
use sqlx::{Pool, Row, Sqlite};

/// Insert or update the progress row for `visit.url` within a job.
pub async fn upsert(pool: &Pool<Sqlite>, job_id: &JobId, visit: &PageVisit) -> Result<()> {
    sqlx::query(
        "INSERT INTO page_visits (job_id, url, seed_url, status, message, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (job_id, url) DO UPDATE SET
             seed_url = excluded.seed_url,
             status = excluded.status,
             message = excluded.message,
             updated_at = excluded.updated_at",
    )
    .bind(job_id.as_str())
    .bind(&visit.url)
    .bind(&visit.seed_url)
    .bind(visit.status.as_str())
    .bind(&visit.message)
    .bind(Timestamp::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Get all progress rows of a job in the order they were last updated.
pub async fn get_by_job(pool: &Pool<Sqlite>, job_id: &JobId) -> Result<Vec<PageVisit>> {
    let rows = sqlx::query(
        "SELECT url, seed_url, status, message FROM page_visits
         WHERE job_id = ? ORDER BY updated_at, url",
    )
    .bind(job_id.as_str())
    .fetch_all(pool)
    .await?;

    let mut visits = Vec::with_capacity(rows.len());
    for row in rows {
        let status: String = row.try_get("status")?;
        visits.push(PageVisit {
            url: row.try_get("url")?,
            seed_url: row.try_get("seed_url")?,
            status: status.parse::<PageStatus>()?,
            message: row.try_get("message")?,
        });
    }

    Ok(visits)
}
