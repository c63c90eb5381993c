//! Bounded breadth-first crawl of a single site.

use crate::classifier::{in_scope, normalize, resolve};
use crate::error::{CrawlError, Result};
use crate::extractor::{extract, ContactSet};
use crate::frontier::{FrontierItem, TraversalFrontier};
use crate::sink::ProgressSink;
use harvest_browser::{FetchError, PageFetcher, RenderedPage, ScreenshotCapture};
use harvest_core::{CrawlConfig, JobId, PageStatus, PageVisit, SiteResult, HOMEPAGE_SCREENSHOT};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Slack past the fetcher's own navigation deadline before a fetch is abandoned.
const FETCH_GRACE: Duration = Duration::from_secs(5);

/// Traversal limits for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Deepest link distance from the seed that is still fetched
    pub max_depth: u32,
    /// Most distinct pages fetched per site
    pub max_pages: usize,
    /// Pause after each successful fetch
    pub per_request_delay: Duration,
    /// Deadline for a single page fetch
    pub navigate_timeout: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from(&CrawlConfig::default())
    }
}

impl From<&CrawlConfig> for CrawlSettings {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_pages: config.max_pages_per_site,
            per_request_delay: config.per_request_delay(),
            navigate_timeout: config.navigate_timeout(),
        }
    }
}

/// Outcome of a finished site crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteReport {
    /// Aggregated contacts and screenshots
    pub result: SiteResult,
    /// Pages fetched successfully
    pub pages_fetched: usize,
    /// Pages whose fetch failed
    pub pages_failed: usize,
}

impl SiteReport {
    /// One-line summary for the seed's progress row.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} pages fetched, {} failed",
            self.pages_fetched, self.pages_failed
        )
    }
}

/// Mutable state of one traversal.
struct Traversal {
    frontier: TraversalFrontier,
    contacts: ContactSet,
    screenshots: BTreeMap<String, String>,
}

/// Crawls one seed URL through a caller-provided page fetcher.
///
/// Each call owns its frontier, so one crawler can serve many sites at once.
#[derive(Clone)]
pub struct SiteCrawler {
    settings: CrawlSettings,
    capture: Arc<dyn ScreenshotCapture>,
    sink: Arc<dyn ProgressSink>,
    /// Normalized seeds of the current job; their rows belong to the orchestrator
    reserved: Arc<HashSet<String>>,
}

impl SiteCrawler {
    /// Create a crawler reporting page progress to `sink`.
    #[must_use]
    pub fn new(
        settings: CrawlSettings,
        capture: Arc<dyn ScreenshotCapture>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            settings,
            capture,
            sink,
            reserved: Arc::default(),
        }
    }

    /// A crawler for one job that leaves the progress rows of `seeds` alone.
    ///
    /// A seed reached as a sub-page of another seed is still fetched and
    /// mined, but only its own site crawl reports on it.
    #[must_use]
    pub fn reserving_seeds(&self, seeds: &[String]) -> Self {
        Self {
            reserved: Arc::new(seeds.iter().map(|seed| normalize(seed)).collect()),
            ..self.clone()
        }
    }

    /// Traversal limits in use.
    #[must_use]
    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Traverse the site rooted at `seed`.
    ///
    /// Failures of pages below the seed are logged, reported and skipped. An
    /// unreachable seed page fails the site with [`CrawlError::SiteCrawl`];
    /// cancellation returns [`CrawlError::Cancelled`] and drops partial results.
    pub async fn crawl(
        &self,
        job_id: &JobId,
        seed: &str,
        fetcher: &dyn PageFetcher,
        cancel: &CancellationToken,
    ) -> Result<SiteReport> {
        let mut state = Traversal {
            frontier: TraversalFrontier::new(
                seed,
                self.settings.max_depth,
                self.settings.max_pages,
            ),
            contacts: ContactSet::default(),
            screenshots: BTreeMap::new(),
        };
        let mut report = SiteReport::default();

        while let Some(item) = state.frontier.pop() {
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }

            let is_seed = item.depth == 0;
            if !is_seed {
                self.report(job_id, seed, &item.url, PageStatus::Processing, None)
                    .await;
            }

            let page = match self.fetch(fetcher, &item.url, cancel).await {
                Ok(page) => page,
                Err(CrawlError::PageFetch(e)) if is_seed => {
                    return Err(CrawlError::SiteCrawl(format!("seed page unreachable: {e}")));
                }
                Err(CrawlError::PageFetch(e)) => {
                    tracing::warn!("Skipping {}: {}", item.url, e);
                    report.pages_failed += 1;
                    let message = Some(e.to_string());
                    self.report(job_id, seed, &item.url, PageStatus::Failed, message)
                        .await;
                    continue;
                }
                Err(e) => return Err(e),
            };
            report.pages_fetched += 1;

            let processed = self
                .process_page(page.as_ref(), &item, seed, &mut state, cancel)
                .await;
            page.close().await;
            processed?;

            if !is_seed {
                self.report(job_id, seed, &item.url, PageStatus::Completed, None)
                    .await;
            }
        }

        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        tracing::info!(
            "Finished {}: {} pages, {} emails",
            seed,
            state.frontier.visited_count(),
            state.contacts.emails.len()
        );
        report.result = state.contacts.into_site_result(state.screenshots);
        Ok(report)
    }

    async fn fetch(
        &self,
        fetcher: &dyn PageFetcher,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn RenderedPage>> {
        let timeout = self.settings.navigate_timeout;
        let backstop = timeout + FETCH_GRACE;
        tokio::select! {
            () = cancel.cancelled() => Err(CrawlError::Cancelled),
            fetched = tokio::time::timeout(backstop, fetcher.fetch(url, timeout)) => match fetched {
                Ok(page) => Ok(page?),
                Err(_) => Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                }
                .into()),
            },
        }
    }

    async fn process_page(
        &self,
        page: &dyn RenderedPage,
        item: &FrontierItem,
        seed: &str,
        state: &mut Traversal,
        cancel: &CancellationToken,
    ) -> Result<()> {
        tokio::select! {
            () = cancel.cancelled() => return Err(CrawlError::Cancelled),
            () = tokio::time::sleep(self.settings.per_request_delay) => {}
        }

        if item.depth == 0 {
            match self.capture.capture(page, seed).await {
                Ok(path) => {
                    state
                        .screenshots
                        .insert(HOMEPAGE_SCREENSHOT.to_string(), path);
                }
                Err(e) => tracing::warn!("Screenshot of {} failed: {}", seed, e),
            }
        }

        let snapshot = page.snapshot();
        state.contacts.merge(extract(snapshot));

        if item.depth < self.settings.max_depth {
            let base = if snapshot.url.is_empty() {
                item.url.as_str()
            } else {
                snapshot.url.as_str()
            };
            let mut queued = 0;
            for anchor in &snapshot.anchors {
                let Some(candidate) = resolve(base, &anchor.href) else {
                    continue;
                };
                if !in_scope(&candidate, seed) {
                    tracing::trace!("Out of scope: {}", candidate);
                    continue;
                }
                if state.frontier.offer(&candidate, item.depth + 1) {
                    queued += 1;
                }
            }
            tracing::debug!(
                "{} (depth {}): {} links queued",
                item.url,
                item.depth,
                queued
            );
        }

        Ok(())
    }

    async fn report(
        &self,
        job_id: &JobId,
        seed: &str,
        url: &str,
        status: PageStatus,
        message: Option<String>,
    ) {
        if self.reserved.contains(&normalize(url)) {
            tracing::trace!("Not reporting {} under {}: it is a seed of this job", url, seed);
            return;
        }
        let visit = PageVisit::new(seed, url, status, message);
        if let Err(e) = self.sink.upsert_page_status(job_id, &visit).await {
            tracing::warn!("Could not record {} as {}: {}", url, status, e);
        }
    }
}
