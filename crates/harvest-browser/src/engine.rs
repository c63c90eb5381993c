use crate::actions::{BrowserLauncher, BrowserSession, PageFetcher, RenderedPage};
use crate::error::{BrowserError, CaptureError, FetchError, Result};
use crate::page::{Anchor, FetchedPage};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use harvest_core::BrowserConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Reads visible text and anchors from the live DOM in one round trip.
const DOM_SNAPSHOT_SCRIPT: &str = r"(() => ({
    text: document.body ? document.body.innerText : '',
    anchors: Array.from(document.querySelectorAll('a[href]')).map((a) => ({
        href: a.getAttribute('href') || '',
        text: (a.textContent || '').trim(),
        aria_label: a.getAttribute('aria-label'),
    })),
}))()";

#[derive(Debug, Deserialize)]
struct DomSnapshot {
    text: String,
    anchors: Vec<Anchor>,
}

/// Launches a Chromium engine per job.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>> {
        let engine = BrowserEngine::launch(&self.config).await?;
        Ok(Arc::new(engine))
    }
}

/// Browser automation engine
pub struct BrowserEngine {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
    user_agent: String,
}

impl BrowserEngine {
    /// Launch Chromium with the given settings.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromiumConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        let chromium_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // Drive the CDP connection until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        tracing::info!("Chromium engine launched (headless: {})", config.headless);

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait::async_trait]
impl BrowserSession for BrowserEngine {
    async fn new_context(&self) -> Result<Box<dyn PageFetcher>> {
        // A context is only handed out while the engine still answers
        self.browser
            .lock()
            .await
            .version()
            .await
            .map_err(|e| BrowserError::Context(e.to_string()))?;

        Ok(Box::new(ChromiumContext {
            browser: self.browser.clone(),
            user_agent: self.user_agent.clone(),
        }))
    }

    async fn shutdown(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!("Browser process wait failed: {}", e);
        }
        self.handler.abort();
        tracing::info!("Chromium engine shut down");
    }
}

/// Tabs opened for one site on a shared browser.
struct ChromiumContext {
    browser: Arc<Mutex<Browser>>,
    user_agent: String,
}

impl ChromiumContext {
    async fn open_tab(&self, url: &str) -> std::result::Result<TabGuard, FetchError> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let tab = TabGuard::new(page, url);

        if let Err(e) = tab
            .page
            .execute(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
        {
            tracing::debug!("Could not override user agent for {}: {}", url, e);
        }

        Ok(tab)
    }

    async fn read_page(page: &Page, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        let markup = page.content().await.map_err(|e| FetchError::Content {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let final_url = match page.url().await {
            Ok(Some(current)) => current,
            _ => url.to_string(),
        };

        let dom = match page.evaluate(DOM_SNAPSHOT_SCRIPT).await {
            Ok(result) => result.into_value::<DomSnapshot>().ok(),
            Err(e) => {
                tracing::debug!("DOM snapshot script failed on {}: {}", url, e);
                None
            }
        };

        Ok(match dom {
            Some(dom) => FetchedPage {
                url: final_url,
                markup,
                text: dom.text,
                anchors: dom.anchors,
            },
            None => FetchedPage::from_markup(final_url, markup),
        })
    }
}

#[async_trait::async_trait]
impl PageFetcher for ChromiumContext {
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<Box<dyn RenderedPage>, FetchError> {
        let tab = self.open_tab(url).await?;
        let page = &tab.page;

        let navigation = tokio::time::timeout(timeout, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await;

        let outcome = match navigation {
            Ok(Ok(())) => Self::read_page(page, url).await,
            Ok(Err(e)) => Err(FetchError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        };

        match outcome {
            Ok(snapshot) => {
                tracing::debug!(
                    "Fetched {} ({} bytes, {} anchors)",
                    url,
                    snapshot.markup.len(),
                    snapshot.anchors.len()
                );
                Ok(Box::new(ChromiumPage {
                    page: tab.release(),
                    snapshot,
                }))
            }
            Err(e) => {
                tab.close().await;
                Err(e)
            }
        }
    }
}

/// An open tab that is closed when dropped, unless released to a `ChromiumPage`.
///
/// A fetch future abandoned by its caller (deadline or cancellation) still
/// closes its tab this way.
struct TabGuard {
    page: Page,
    url: String,
    armed: bool,
}

impl TabGuard {
    fn new(page: Page, url: &str) -> Self {
        Self {
            page,
            url: url.to_string(),
            armed: true,
        }
    }

    fn release(mut self) -> Page {
        self.armed = false;
        self.page.clone()
    }

    async fn close(mut self) {
        self.armed = false;
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!("Failed to close tab for {}: {}", self.url, e);
        }
    }
}

impl Drop for TabGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let page = self.page.clone();
        let url = std::mem::take(&mut self.url);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::debug!("Failed to close abandoned tab for {}: {}", url, e);
                    }
                });
            }
            Err(_) => tracing::warn!("No runtime left to close tab for {}", url),
        }
    }
}

struct ChromiumPage {
    page: Page,
    snapshot: FetchedPage,
}

#[async_trait::async_trait]
impl RenderedPage for ChromiumPage {
    fn snapshot(&self) -> &FetchedPage {
        &self.snapshot
    }

    async fn screenshot(&self, full_page: bool) -> std::result::Result<Vec<u8>, CaptureError> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(full_page).build())
            .await
            .map_err(|e| CaptureError::Capture(e.to_string()))
    }

    async fn close(&self) {
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!("Failed to close tab for {}: {}", self.snapshot.url, e);
        }
    }
}
