use crate::error::{CaptureError, FetchError, Result};
use crate::page::FetchedPage;
use std::sync::Arc;
use std::time::Duration;

/// Starts a browser engine for one job.
#[async_trait::async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch the engine. Failure here means no site of the job can be crawled.
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>>;
}

/// A running browser engine shared by the sites of one job.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a browsing context for a single site.
    async fn new_context(&self) -> Result<Box<dyn PageFetcher>>;

    /// Close the engine and release its resources.
    async fn shutdown(&self);
}

/// Fetches rendered pages within one browsing context.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Navigate to `url` and wait for the page to settle, giving up after `timeout`.
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<Box<dyn RenderedPage>, FetchError>;

    /// Release the context. Pages already returned stay valid until closed.
    async fn close(&self) {}
}

/// A loaded page whose content has been read.
#[async_trait::async_trait]
pub trait RenderedPage: Send + Sync {
    /// Markup, visible text and anchors read after navigation.
    fn snapshot(&self) -> &FetchedPage;

    /// Encode the page as PNG.
    async fn screenshot(&self, full_page: bool) -> std::result::Result<Vec<u8>, CaptureError>;

    /// Close the underlying tab.
    async fn close(&self);
}

/// Persists a screenshot of a page and reports where it went.
#[async_trait::async_trait]
pub trait ScreenshotCapture: Send + Sync {
    /// Capture `page` (the seed page of `seed_url`) and return its storage path.
    async fn capture(
        &self,
        page: &dyn RenderedPage,
        seed_url: &str,
    ) -> std::result::Result<String, CaptureError>;
}
