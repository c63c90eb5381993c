//! Fake browser over an in-memory link graph.

#![allow(dead_code)]

use harvest_browser::{
    BrowserError, BrowserLauncher, BrowserSession, CaptureError, FetchError, FetchedPage,
    PageFetcher, RenderedPage, ScreenshotCapture,
};
use harvest_crawler::{normalize, CrawlSettings};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum Resource {
    Page(String),
    Hang,
}

/// Pages keyed by normalized URL, plus a log of every fetch.
#[derive(Default)]
pub struct FakeWeb {
    pages: HashMap<String, Resource>,
    fetches: Mutex<Vec<String>>,
    fetch_delay: Duration,
    tab_open_delay: Duration,
    open_tabs: AtomicUsize,
    active_contexts: AtomicUsize,
    peak_contexts: AtomicUsize,
    contexts_opened: AtomicUsize,
    fail_contexts: AtomicBool,
    shutdowns: AtomicUsize,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, markup: &str) -> Self {
        self.pages
            .insert(normalize(url), Resource::Page(markup.to_string()));
        self
    }

    pub fn hanging(mut self, url: &str) -> Self {
        self.pages.insert(normalize(url), Resource::Hang);
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Time spent opening a tab before navigation starts.
    pub fn with_tab_delay(mut self, delay: Duration) -> Self {
        self.tab_open_delay = delay;
        self
    }

    pub fn failing_contexts(self) -> Self {
        self.fail_contexts.store(true, Ordering::SeqCst);
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetched_keys(&self) -> Vec<String> {
        self.fetches().iter().map(|url| normalize(url)).collect()
    }

    /// Tabs opened and not yet closed.
    pub fn open_tabs(&self) -> usize {
        self.open_tabs.load(Ordering::SeqCst)
    }

    pub fn peak_contexts(&self) -> usize {
        self.peak_contexts.load(Ordering::SeqCst)
    }

    pub fn contexts_opened(&self) -> usize {
        self.contexts_opened.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

pub struct FakeLauncher {
    pub web: Arc<FakeWeb>,
    pub fail: bool,
}

impl FakeLauncher {
    pub fn new(web: Arc<FakeWeb>) -> Self {
        Self { web, fail: false }
    }

    pub fn broken(web: Arc<FakeWeb>) -> Self {
        Self { web, fail: true }
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> harvest_browser::Result<Arc<dyn BrowserSession>> {
        if self.fail {
            return Err(BrowserError::Launch("no browser binary".to_string()));
        }
        Ok(Arc::new(FakeSession {
            web: self.web.clone(),
        }))
    }
}

struct FakeSession {
    web: Arc<FakeWeb>,
}

#[async_trait::async_trait]
impl BrowserSession for FakeSession {
    async fn new_context(&self) -> harvest_browser::Result<Box<dyn PageFetcher>> {
        if self.web.fail_contexts.load(Ordering::SeqCst) {
            return Err(BrowserError::Context("target crashed".to_string()));
        }
        self.web.contexts_opened.fetch_add(1, Ordering::SeqCst);
        let active = self.web.active_contexts.fetch_add(1, Ordering::SeqCst) + 1;
        self.web.peak_contexts.fetch_max(active, Ordering::SeqCst);
        Ok(Box::new(FakeFetcher {
            web: self.web.clone(),
        }))
    }

    async fn shutdown(&self) {
        self.web.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeFetcher {
    pub web: Arc<FakeWeb>,
}

#[async_trait::async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Box<dyn RenderedPage>, FetchError> {
        self.web.fetches.lock().unwrap().push(url.to_string());
        if !self.web.fetch_delay.is_zero() {
            tokio::time::sleep(self.web.fetch_delay).await;
        }

        // Tabs are closed explicitly, as the engine does, never on drop
        self.web.open_tabs.fetch_add(1, Ordering::SeqCst);
        if !self.web.tab_open_delay.is_zero() {
            tokio::time::sleep(self.web.tab_open_delay).await;
        }

        match self.web.pages.get(&normalize(url)).cloned() {
            Some(Resource::Page(markup)) => Ok(Box::new(FakePage {
                snapshot: FetchedPage::from_markup(url, markup),
                web: self.web.clone(),
            })),
            Some(Resource::Hang) => {
                tokio::time::sleep(timeout).await;
                self.web.open_tabs.fetch_sub(1, Ordering::SeqCst);
                Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                })
            }
            None => {
                self.web.open_tabs.fetch_sub(1, Ordering::SeqCst);
                Err(FetchError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                })
            }
        }
    }

    async fn close(&self) {
        self.web.active_contexts.fetch_sub(1, Ordering::SeqCst);
    }
}

struct FakePage {
    snapshot: FetchedPage,
    web: Arc<FakeWeb>,
}

#[async_trait::async_trait]
impl RenderedPage for FakePage {
    fn snapshot(&self) -> &FetchedPage {
        &self.snapshot
    }

    async fn screenshot(&self, _full_page: bool) -> Result<Vec<u8>, CaptureError> {
        Ok(b"\x89PNG".to_vec())
    }

    async fn close(&self) {
        self.web.open_tabs.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Records which pages were captured; optionally fails every capture.
#[derive(Default)]
pub struct RecordingCapture {
    pub captured: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingCapture {
    pub fn failing() -> Self {
        Self {
            captured: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn captured(&self) -> Vec<String> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ScreenshotCapture for RecordingCapture {
    async fn capture(&self, page: &dyn RenderedPage, seed_url: &str) -> Result<String, CaptureError> {
        if self.fail {
            return Err(CaptureError::Capture("renderer crashed".to_string()));
        }
        self.captured
            .lock()
            .unwrap()
            .push(page.snapshot().url.clone());
        Ok(format!("/tmp/shots/{}.png", normalize(seed_url).len()))
    }
}

/// Settings with no politeness delay so tests run fast.
pub fn fast_settings() -> CrawlSettings {
    CrawlSettings {
        per_request_delay: Duration::ZERO,
        navigate_timeout: Duration::from_secs(5),
        ..CrawlSettings::default()
    }
}

/// Markup with one anchor per href.
pub fn links(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{href}">link</a>"#))
        .collect();
    format!("<html><body>{anchors}</body></html>")
}
