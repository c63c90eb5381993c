//! Shared types used across the Harvest crawler.
//!
//! This module defines the job and result model produced by the crawl engine
//! and persisted by the progress store.

use crate::error::HarvestError;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Screenshot role recorded for the seed page of every site.
pub const HOMEPAGE_SCREENSHOT: &str = "homepage";

/// Newtype for job identifiers with validation.
///
/// Job IDs are opaque tokens generated as UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Create a new `JobId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is not a valid UUID v4.
    pub fn new(id: impl Into<String>) -> Result<Self, HarvestError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Create a new random `JobId` using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), HarvestError> {
        static UUID_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = UUID_REGEX.get_or_init(|| {
            Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
                .expect("valid regex")
        });

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(HarvestError::InvalidJobId(id.to_string()))
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Lifecycle state of a crawl job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Submitted, not yet picked up
    Pending,
    /// Sites are being crawled
    Running,
    /// Every seed was attempted; results attached
    Completed,
    /// The job could not start (browser engine unavailable)
    Failed,
    /// Stopped before every seed finished
    Cancelled,
}

impl JobStatus {
    /// Stored representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the job can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(HarvestError::UnknownStatus {
                kind: "job",
                value: other.to_string(),
            }),
        }
    }
}

/// Progress state of a single page (or seed) within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Discovered, not yet fetched
    Pending,
    /// Fetch or crawl in progress
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

impl PageStatus {
    /// Stored representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageStatus {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(HarvestError::UnknownStatus {
                kind: "page",
                value: other.to_string(),
            }),
        }
    }
}

/// Social platforms whose profile links are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// facebook.com
    Facebook,
    /// instagram.com
    Instagram,
    /// tiktok.com
    Tiktok,
}

impl Platform {
    /// Every supported platform, in result-field order.
    pub const ALL: [Platform; 3] = [Self::Facebook, Self::Instagram, Self::Tiktok];

    /// Lower-case platform name, as matched against accessible labels.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
        }
    }

    /// Domain substring identifying a link to this platform.
    #[must_use]
    pub fn domain(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook.com",
            Self::Instagram => "instagram.com",
            Self::Tiktok => "tiktok.com",
        }
    }

    /// Canonical profile URL for a bare handle (no leading `@`).
    ///
    /// TikTok keeps the `@` in the path.
    #[must_use]
    pub fn profile_url(&self, handle: &str) -> String {
        match self {
            Self::Tiktok => format!("https://{}/@{handle}", self.domain()),
            Self::Facebook | Self::Instagram => format!("https://{}/{handle}", self.domain()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregated contact data for one seed URL.
///
/// Every list holds canonical, de-duplicated values. List order is not part
/// of the contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteResult {
    /// Canonical, lower-cased email addresses
    pub emails: Vec<String>,
    /// Canonical Facebook profile URLs
    pub facebook: Vec<String>,
    /// Canonical Instagram profile URLs
    pub instagram: Vec<String>,
    /// Canonical TikTok profile URLs
    pub tiktok: Vec<String>,
    /// Screenshot role -> storage path
    pub screenshots: BTreeMap<String, String>,
}

impl SiteResult {
    /// Profile URLs collected for a platform.
    #[must_use]
    pub fn social(&self, platform: Platform) -> &[String] {
        match platform {
            Platform::Facebook => &self.facebook,
            Platform::Instagram => &self.instagram,
            Platform::Tiktok => &self.tiktok,
        }
    }

    /// True when no contact signal was found (screenshots are not contacts).
    #[must_use]
    pub fn has_no_contacts(&self) -> bool {
        self.emails.is_empty() && Platform::ALL.iter().all(|p| self.social(*p).is_empty())
    }
}

/// Final results of a job keyed by seed URL.
pub type JobResults = BTreeMap<String, SiteResult>;

/// A crawl job as persisted by the progress store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier
    pub id: JobId,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Submission time
    pub created_at: Timestamp,
    /// Time the job reached a terminal state
    pub completed_at: Option<Timestamp>,
    /// Seed URLs in submission order
    pub seed_urls: Vec<String>,
    /// Per-seed results, present once the job has finished
    pub results: Option<JobResults>,
    /// Reason the job failed, if it did
    pub error_message: Option<String>,
}

impl Job {
    /// Create a pending job for the given seeds.
    #[must_use]
    pub fn new(seed_urls: Vec<String>) -> Self {
        Self {
            id: JobId::generate(),
            status: JobStatus::Pending,
            created_at: Timestamp::now(),
            completed_at: None,
            seed_urls,
            results: None,
            error_message: None,
        }
    }
}

/// Progress row for one URL within a job.
///
/// Keyed by `(job, url)`; the row whose `url` equals its `seed_url` carries the
/// status of the whole site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVisit {
    /// Seed URL whose traversal discovered this page
    pub seed_url: String,
    /// Page URL
    pub url: String,
    /// Progress state
    pub status: PageStatus,
    /// Human-readable detail (error text for failures)
    pub message: Option<String>,
}

impl PageVisit {
    /// Create a progress row.
    #[must_use]
    pub fn new(
        seed_url: impl Into<String>,
        url: impl Into<String>,
        status: PageStatus,
        message: Option<String>,
    ) -> Self {
        Self {
            seed_url: seed_url.into(),
            url: url.into(),
            status,
            message,
        }
    }

    /// Create the site-level row for a seed URL.
    #[must_use]
    pub fn seed(seed_url: &str, status: PageStatus, message: Option<String>) -> Self {
        Self::new(seed_url, seed_url, status, message)
    }

    /// Whether this row tracks a whole site rather than a sub-page.
    #[must_use]
    pub fn is_seed(&self) -> bool {
        self.seed_url == self.url
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, HarvestError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(HarvestError::from)
    }

    /// Format as a fixed-width RFC3339 string (`Z` suffix, nanoseconds).
    ///
    /// Fixed width keeps stored timestamps ordered under plain string comparison.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_valid() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        let job_id = JobId::new(id).expect("valid job ID");
        assert_eq!(job_id.as_str(), id);
    }

    #[test]
    fn test_job_id_invalid() {
        assert!(JobId::new("not-a-uuid").is_err());
        assert!(JobId::new("").is_err());
        assert!("550E8400-E29B-41D4-A716-446655440000".parse::<JobId>().is_err());
    }

    #[test]
    fn test_job_id_generate() {
        let id = JobId::generate();
        assert!(JobId::new(id.as_str()).is_ok());
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("done".parse::<JobStatus>().is_err());
        assert_eq!("processing".parse::<PageStatus>().unwrap(), PageStatus::Processing);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_platform_profile_urls() {
        assert_eq!(
            Platform::Facebook.profile_url("acme"),
            "https://facebook.com/acme"
        );
        assert_eq!(
            Platform::Instagram.profile_url("acme"),
            "https://instagram.com/acme"
        );
        assert_eq!(Platform::Tiktok.profile_url("acme"), "https://tiktok.com/@acme");
    }

    #[test]
    fn test_site_result_serialization_shape() {
        let mut result = SiteResult {
            emails: vec!["hi@acme.com".to_string()],
            facebook: vec!["https://facebook.com/acme".to_string()],
            ..SiteResult::default()
        };
        result
            .screenshots
            .insert(HOMEPAGE_SCREENSHOT.to_string(), "/tmp/a.png".to_string());

        let json = serde_json::to_value(&result).expect("serialize site result");
        assert_eq!(json["emails"][0], "hi@acme.com");
        assert_eq!(json["instagram"], serde_json::json!([]));
        assert_eq!(json["tiktok"], serde_json::json!([]));
        assert_eq!(json["screenshots"]["homepage"], "/tmp/a.png");
        assert!(!result.has_no_contacts());
        assert!(SiteResult::default().has_no_contacts());
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new(vec!["https://acme.com".to_string()]);
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.completed_at.is_none());
        assert!(job.results.is_none());
    }

    #[test]
    fn test_seed_page_visit() {
        let visit = PageVisit::seed("https://acme.com", PageStatus::Processing, None);
        assert!(visit.is_seed());
        let page = PageVisit::new(
            "https://acme.com",
            "https://acme.com/contact",
            PageStatus::Completed,
            None,
        );
        assert!(!page.is_seed());
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let ts = Timestamp::now();
        let parsed = Timestamp::from_rfc3339(&ts.to_rfc3339()).expect("parse timestamp");
        assert_eq!(ts, parsed);
        assert!(ts.to_rfc3339().ends_with('Z'));
        assert!(Timestamp::from_rfc3339("yesterday").is_err());
    }
}
