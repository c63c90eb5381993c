//! Harvest Crawler - Contact crawling orchestration.
//!
//! This crate turns a batch of seed URLs into per-site contact results. Each
//! site gets a bounded breadth-first traversal limited to contact-like pages;
//! every fetched page is mined for emails and social profile links.
//!
//! # Features
//!
//! - Breadth-first traversal bounded by depth and page budget
//! - Scope filtering to same-origin, contact-indicative paths
//! - Obfuscation-aware email extraction and canonical social profile URLs
//! - Concurrent sites per job with per-site failure isolation
//! - Cancellation of running jobs
//! - Progress reporting to `SQLite` or memory
//!
//! # Example
//!
//! ```rust,ignore
//! use harvest_crawler::{CrawlSettings, DatabaseSink, JobOrchestrator};
//! use std::sync::Arc;
//!
//! let orchestrator = JobOrchestrator::new(
//!     Arc::new(launcher),
//!     Arc::new(screenshot_store),
//!     Arc::new(DatabaseSink::new(db)),
//!     CrawlSettings::default(),
//! )
//! .with_max_concurrent_sites(3);
//!
//! let handle = orchestrator.submit(vec!["https://acme.com".into()]).await?;
//! let outcome = handle.wait().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod classifier;
#[allow(missing_docs)]
pub mod error;
pub mod extractor;
pub mod frontier;
pub mod orchestrator;
pub mod seeds;
pub mod sink;
pub mod site;

// Re-export commonly used types
pub use classifier::{in_scope, normalize};
pub use error::{CrawlError, Result};
pub use extractor::{extract, normalize_social_url, ContactSet};
pub use frontier::{FrontierItem, TraversalFrontier};
pub use orchestrator::{JobHandle, JobOrchestrator, JobOutcome};
pub use seeds::validate_urls;
pub use sink::{DatabaseSink, MemorySink, ProgressSink};
pub use site::{CrawlSettings, SiteCrawler, SiteReport};
