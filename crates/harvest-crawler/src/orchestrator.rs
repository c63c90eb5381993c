//! Job orchestrator for crawling a batch of seed URLs.
//!
//! This module provides the `JobOrchestrator`, which launches one browser per
//! job, crawls every seed with bounded concurrency, isolates per-site failures,
//! and reports job and site progress to a [`ProgressSink`].

use crate::classifier::normalize;
use crate::error::{CrawlError, Result};
use crate::sink::ProgressSink;
use crate::site::{CrawlSettings, SiteCrawler, SiteReport};
use futures::stream::{FuturesUnordered, StreamExt};
use harvest_browser::{BrowserLauncher, BrowserSession, ScreenshotCapture};
use harvest_core::{Job, JobId, JobResults, JobStatus, PageStatus, PageVisit, SiteResult};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Default number of sites crawled at the same time within a job.
const DEFAULT_MAX_CONCURRENT_SITES: usize = 3;

/// Final state of a job that got past browser launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// `Completed`, or `Cancelled` if the job was cancelled
    pub status: JobStatus,
    /// Results of the sites that finished
    pub results: JobResults,
}

/// Handle to a job running in the background.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<Result<JobOutcome>>,
}

impl JobHandle {
    /// ID of the running job.
    #[must_use]
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Ask the job to stop. Sites already finished keep their results.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this job when triggered.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the job to finish.
    pub async fn wait(self) -> Result<JobOutcome> {
        self.task
            .await
            .map_err(|e| CrawlError::Aborted(e.to_string()))?
    }
}

/// Runs crawl jobs against a browser launcher and a progress sink.
#[derive(Clone)]
pub struct JobOrchestrator {
    /// Starts one browser per job
    launcher: Arc<dyn BrowserLauncher>,
    /// Per-site traversal
    crawler: SiteCrawler,
    /// Job and page progress
    sink: Arc<dyn ProgressSink>,
    /// Maximum sites crawled at once
    max_concurrent_sites: usize,
}

impl JobOrchestrator {
    /// Create a new job orchestrator.
    #[must_use]
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        capture: Arc<dyn ScreenshotCapture>,
        sink: Arc<dyn ProgressSink>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            launcher,
            crawler: SiteCrawler::new(settings, capture, sink.clone()),
            sink,
            max_concurrent_sites: DEFAULT_MAX_CONCURRENT_SITES,
        }
    }

    /// Set the maximum number of sites crawled at once.
    #[must_use]
    pub fn with_max_concurrent_sites(mut self, max: usize) -> Self {
        self.max_concurrent_sites = max.max(1);
        self
    }

    /// The progress sink jobs report to.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn ProgressSink> {
        &self.sink
    }

    /// Submit a job and run it in the background.
    ///
    /// Seeds are de-duplicated under [`normalize`], keeping the first spelling.
    /// The job is recorded as pending before this returns.
    pub async fn submit(&self, urls: Vec<String>) -> Result<JobHandle> {
        let mut seen = HashSet::new();
        let seeds: Vec<String> = urls
            .into_iter()
            .filter(|url| seen.insert(normalize(url)))
            .collect();

        let job = Job::new(seeds);
        self.sink.create_job(&job).await?;

        let job_id = job.id.clone();
        let cancel = CancellationToken::new();
        let orchestrator = self.clone();
        let token = cancel.clone();
        let task_job_id = job_id.clone();

        tracing::info!("Submitted job {} with {} seeds", job_id, job.seed_urls.len());

        // Launch job execution in background
        let task = tokio::spawn(async move {
            let result = orchestrator
                .run_job(&task_job_id, &job.seed_urls, &token)
                .await;
            if let Err(e) = &result {
                tracing::error!("Job {} failed: {}", task_job_id, e);
            }
            result
        });

        Ok(JobHandle {
            job_id,
            cancel,
            task,
        })
    }

    /// Execute a job to completion.
    ///
    /// Returns an error only when the browser cannot be launched, in which case
    /// the job is marked failed and no site is attempted.
    pub async fn run_job(
        &self,
        job_id: &JobId,
        seeds: &[String],
        cancel: &CancellationToken,
    ) -> Result<JobOutcome> {
        self.set_status(job_id, JobStatus::Running, None).await;

        let session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                let err = CrawlError::JobInit(e.to_string());
                self.set_status(job_id, JobStatus::Failed, Some(&err.to_string()))
                    .await;
                return Err(err);
            }
        };

        for seed in seeds {
            self.report_seed(job_id, seed, PageStatus::Pending, None)
                .await;
        }

        let crawler = self.crawler.reserving_seeds(seeds);
        let results = self
            .crawl_sites(&crawler, job_id, seeds, session.as_ref(), cancel)
            .await;
        session.shutdown().await;

        let status = if cancel.is_cancelled() {
            JobStatus::Cancelled
        } else {
            JobStatus::Completed
        };

        if let Err(e) = self.sink.attach_results(job_id, &results).await {
            tracing::error!("Could not store results of job {}: {}", job_id, e);
        }
        self.set_status(job_id, status, None).await;

        tracing::info!(
            "Job {} {}: {}/{} sites produced results",
            job_id,
            status,
            results.len(),
            seeds.len()
        );
        Ok(JobOutcome { status, results })
    }

    /// Crawl every seed with at most `max_concurrent_sites` in flight.
    async fn crawl_sites(
        &self,
        crawler: &SiteCrawler,
        job_id: &JobId,
        seeds: &[String],
        session: &dyn BrowserSession,
        cancel: &CancellationToken,
    ) -> JobResults {
        let mut futures = FuturesUnordered::new();
        let mut results = JobResults::new();

        for seed in seeds {
            futures.push(self.crawl_site(crawler, job_id, seed, session, cancel));

            // Respect concurrency limit
            while futures.len() >= self.max_concurrent_sites {
                if let Some((seed, Some(result))) = futures.next().await {
                    results.insert(seed, result);
                }
            }
        }

        // Collect remaining results
        while let Some((seed, result)) = futures.next().await {
            if let Some(result) = result {
                results.insert(seed, result);
            }
        }

        results
    }

    /// Crawl one seed inside the per-site isolation boundary.
    ///
    /// Returns the seed with its result, or `None` if the site failed or was
    /// cancelled.
    async fn crawl_site(
        &self,
        crawler: &SiteCrawler,
        job_id: &JobId,
        seed: &str,
        session: &dyn BrowserSession,
        cancel: &CancellationToken,
    ) -> (String, Option<SiteResult>) {
        let span = tracing::info_span!("site", job = %job_id, seed = %seed);
        let outcome = self
            .crawl_site_inner(crawler, job_id, seed, session, cancel)
            .instrument(span)
            .await;

        match outcome {
            Ok(report) => {
                self.report_seed(job_id, seed, PageStatus::Completed, Some(report.summary()))
                    .await;
                (seed.to_string(), Some(report.result))
            }
            Err(e) => {
                if matches!(e, CrawlError::Cancelled) {
                    tracing::info!("Site {} cancelled", seed);
                } else {
                    tracing::error!("Site {} failed: {}", seed, e);
                }
                self.report_seed(job_id, seed, PageStatus::Failed, Some(e.to_string()))
                    .await;
                (seed.to_string(), None)
            }
        }
    }

    async fn crawl_site_inner(
        &self,
        crawler: &SiteCrawler,
        job_id: &JobId,
        seed: &str,
        session: &dyn BrowserSession,
        cancel: &CancellationToken,
    ) -> Result<SiteReport> {
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        self.report_seed(job_id, seed, PageStatus::Processing, None)
            .await;

        let context = session.new_context().await?;
        let report = crawler
            .crawl(job_id, seed, context.as_ref(), cancel)
            .await;
        context.close().await;
        report
    }

    async fn report_seed(
        &self,
        job_id: &JobId,
        seed: &str,
        status: PageStatus,
        message: Option<String>,
    ) {
        let visit = PageVisit::seed(seed, status, message);
        if let Err(e) = self.sink.upsert_page_status(job_id, &visit).await {
            tracing::warn!("Could not record {} as {}: {}", seed, status, e);
        }
    }

    async fn set_status(&self, job_id: &JobId, status: JobStatus, message: Option<&str>) {
        if let Err(e) = self.sink.set_job_status(job_id, status, message).await {
            tracing::warn!("Could not mark job {} {}: {}", job_id, status, e);
        }
    }
}
