//! Harvest Core - Foundation crate for the Harvest contact crawler.
//!
//! This crate provides the shared data model, error handling, and configuration
//! management that the browser, database, and crawler crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Job and result model (`JobId`, `JobStatus`, `PageVisit`, `SiteResult`)
//!
//! # Example
//!
//! ```rust
//! use harvest_core::{AppConfig, Platform};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.crawl.max_depth, 2);
//! assert_eq!(Platform::Tiktok.profile_url("acme"), "https://tiktok.com/@acme");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, CrawlConfig, DatabaseConfig, RetentionConfig};
pub use error::{ConfigError, ConfigResult, HarvestError, Result};
pub use types::{
    Job, JobId, JobResults, JobStatus, PageStatus, PageVisit, Platform, SiteResult, Timestamp,
    HOMEPAGE_SCREENSHOT,
};
