//! Job records: lifecycle status, seed list and final results.

use crate::error::{DatabaseError, Result};
use harvest_core::{Job, JobId, JobResults, JobStatus, Timestamp};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

const SELECT_JOB: &str =
    "SELECT id, status, created_at, completed_at, seed_urls, results, error_message FROM jobs";

/// Insert a new job record.
pub async fn create_job(pool: &Pool<Sqlite>, job: &Job) -> Result<()> {
    sqlx::query(
        "INSERT INTO jobs (id, status, created_at, completed_at, seed_urls, results, error_message)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(job.id.as_str())
    .bind(job.status.as_str())
    .bind(job.created_at.to_rfc3339())
    .bind(job.completed_at.map(|ts| ts.to_rfc3339()))
    .bind(serde_json::to_string(&job.seed_urls)?)
    .bind(job.results.as_ref().map(serde_json::to_string).transpose()?)
    .bind(&job.error_message)
    .execute(pool)
    .await?;

    tracing::debug!("Created job {} with {} seeds", job.id, job.seed_urls.len());
    Ok(())
}

/// Get a job by ID.
pub async fn get_job(pool: &Pool<Sqlite>, id: &JobId) -> Result<Option<Job>> {
    let row = sqlx::query(&format!("{SELECT_JOB} WHERE id = ?"))
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.map(|r| job_from_row(&r)).transpose()
}

/// List the most recently created jobs, newest first.
pub async fn list_recent(pool: &Pool<Sqlite>, limit: u32) -> Result<Vec<Job>> {
    let rows = sqlx::query(&format!("{SELECT_JOB} ORDER BY created_at DESC LIMIT ?"))
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;

    rows.iter().map(job_from_row).collect()
}

/// Update the status of a job.
///
/// Terminal statuses stamp `completed_at`. An error message, when given,
/// replaces the stored one.
pub async fn set_status(
    pool: &Pool<Sqlite>,
    id: &JobId,
    status: JobStatus,
    error_message: Option<&str>,
) -> Result<()> {
    let completed_at = status.is_terminal().then(|| Timestamp::now().to_rfc3339());

    let result = sqlx::query(
        "UPDATE jobs
         SET status = ?,
             completed_at = COALESCE(?, completed_at),
             error_message = COALESCE(?, error_message)
         WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(completed_at)
    .bind(error_message)
    .bind(id.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::JobNotFound(id.clone()));
    }

    tracing::debug!("Job {} is now {}", id, status);
    Ok(())
}

/// Store the final per-seed results of a job.
pub async fn attach_results(pool: &Pool<Sqlite>, id: &JobId, results: &JobResults) -> Result<()> {
    let result = sqlx::query("UPDATE jobs SET results = ? WHERE id = ?")
        .bind(serde_json::to_string(results)?)
        .bind(id.as_str())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::JobNotFound(id.clone()));
    }

    Ok(())
}

fn job_from_row(row: &SqliteRow) -> Result<Job> {
    let id: String = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;
    let seed_urls: String = row.try_get("seed_urls")?;
    let results: Option<String> = row.try_get("results")?;

    Ok(Job {
        id: JobId::new(id)?,
        status: status.parse::<JobStatus>()?,
        created_at: parse_timestamp(&created_at)?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
        seed_urls: serde_json::from_str(&seed_urls)?,
        results: results.as_deref().map(serde_json::from_str).transpose()?,
        error_message: row.try_get("error_message")?,
    })
}

pub(crate) fn parse_timestamp(value: &str) -> Result<Timestamp> {
    Ok(Timestamp::from_rfc3339(value)?)
}
