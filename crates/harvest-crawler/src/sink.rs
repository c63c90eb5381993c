//! Progress reporting for jobs and pages.
//!
//! Every write is an idempotent upsert, so a repeated report leaves the same
//! state as a single one.

use crate::error::{CrawlError, Result};
use harvest_core::{Job, JobId, JobResults, JobStatus, PageVisit, Timestamp};
use harvest_db::{jobs, page_visits, Database};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Durable record of job and page progress.
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    /// Record a newly submitted job.
    async fn create_job(&self, job: &Job) -> Result<()>;

    /// Insert or replace the progress row for `visit.url`.
    async fn upsert_page_status(&self, job_id: &JobId, visit: &PageVisit) -> Result<()>;

    /// Move the job to `status`; terminal statuses stamp the completion time.
    async fn set_job_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        message: Option<&str>,
    ) -> Result<()>;

    /// Store the final per-seed results.
    async fn attach_results(&self, job_id: &JobId, results: &JobResults) -> Result<()>;

    /// Look up a job.
    async fn get_job(&self, job_id: &JobId) -> Result<Option<Job>>;

    /// All progress rows of a job.
    async fn page_visits(&self, job_id: &JobId) -> Result<Vec<PageVisit>>;
}

/// Sink backed by the `SQLite` database.
#[derive(Debug, Clone)]
pub struct DatabaseSink {
    db: Database,
}

impl DatabaseSink {
    /// Report into `db`, whose migrations must already be applied.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl ProgressSink for DatabaseSink {
    async fn create_job(&self, job: &Job) -> Result<()> {
        Ok(jobs::create_job(self.db.pool(), job).await?)
    }

    async fn upsert_page_status(&self, job_id: &JobId, visit: &PageVisit) -> Result<()> {
        Ok(page_visits::upsert(self.db.pool(), job_id, visit).await?)
    }

    async fn set_job_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        message: Option<&str>,
    ) -> Result<()> {
        Ok(jobs::set_status(self.db.pool(), job_id, status, message).await?)
    }

    async fn attach_results(&self, job_id: &JobId, results: &JobResults) -> Result<()> {
        Ok(jobs::attach_results(self.db.pool(), job_id, results).await?)
    }

    async fn get_job(&self, job_id: &JobId) -> Result<Option<Job>> {
        Ok(jobs::get_job(self.db.pool(), job_id).await?)
    }

    async fn page_visits(&self, job_id: &JobId) -> Result<Vec<PageVisit>> {
        Ok(page_visits::get_by_job(self.db.pool(), job_id).await?)
    }
}

/// In-process sink for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    jobs: RwLock<HashMap<JobId, Job>>,
    pages: RwLock<HashMap<JobId, Vec<PageVisit>>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn unknown_job(job_id: &JobId) -> CrawlError {
    CrawlError::Sink(format!("Job '{job_id}' not found"))
}

#[async_trait::async_trait]
impl ProgressSink for MemorySink {
    async fn create_job(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(CrawlError::Sink(format!("Job '{}' already exists", job.id)));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn upsert_page_status(&self, job_id: &JobId, visit: &PageVisit) -> Result<()> {
        if !self.jobs.read().await.contains_key(job_id) {
            return Err(unknown_job(job_id));
        }

        let mut pages = self.pages.write().await;
        let rows = pages.entry(job_id.clone()).or_default();
        match rows.iter_mut().find(|row| row.url == visit.url) {
            Some(row) => *row = visit.clone(),
            None => rows.push(visit.clone()),
        }
        Ok(())
    }

    async fn set_job_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        message: Option<&str>,
    ) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(job_id).ok_or_else(|| unknown_job(job_id))?;

        job.status = status;
        if status.is_terminal() {
            job.completed_at = Some(Timestamp::now());
        }
        if let Some(message) = message {
            job.error_message = Some(message.to_string());
        }
        Ok(())
    }

    async fn attach_results(&self, job_id: &JobId, results: &JobResults) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(job_id).ok_or_else(|| unknown_job(job_id))?;
        job.results = Some(results.clone());
        Ok(())
    }

    async fn get_job(&self, job_id: &JobId) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.get(job_id).cloned())
    }

    async fn page_visits(&self, job_id: &JobId) -> Result<Vec<PageVisit>> {
        Ok(self
            .pages
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or_default())
    }
}
