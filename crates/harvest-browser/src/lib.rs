//! Headless browser page fetching for the Harvest crawler.
//!
//! The crawler only talks to the traits in [`actions`]; [`engine`] backs them
//! with Chromium and [`screenshot`] stores captured PNGs on disk.

pub mod actions;
pub mod engine;
pub mod error;
pub mod page;
pub mod screenshot;

pub use actions::{BrowserLauncher, BrowserSession, PageFetcher, RenderedPage, ScreenshotCapture};
pub use engine::{BrowserEngine, ChromiumLauncher};
pub use error::{BrowserError, CaptureError, FetchError, Result};
pub use page::{Anchor, FetchedPage};
pub use screenshot::ScreenshotStore;
