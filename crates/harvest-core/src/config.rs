//! Configuration management for Harvest.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/harvest/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Traversal bounds and politeness
    pub crawl: CrawlConfig,
    /// Headless browser settings
    pub browser: BrowserConfig,
    /// Progress store settings
    pub database: DatabaseConfig,
    /// Expiry of old jobs and screenshots
    pub retention: RetentionConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if not found.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `HARVEST_MAX_DEPTH`: Override traversal depth cap
    /// - `HARVEST_MAX_PAGES`: Override per-site page budget
    /// - `HARVEST_DELAY_MS`: Override politeness delay
    /// - `HARVEST_HEADLESS`: Override browser headless mode (true/false)
    /// - `HARVEST_DB_PATH`: Override database file location
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Apply `HARVEST_*` environment overrides in place.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("HARVEST_MAX_DEPTH") {
            if let Ok(depth) = val.parse() {
                self.crawl.max_depth = depth;
                tracing::debug!("Override crawl.max_depth from env: {}", depth);
            }
        }

        if let Ok(val) = std::env::var("HARVEST_MAX_PAGES") {
            if let Ok(pages) = val.parse() {
                self.crawl.max_pages_per_site = pages;
                tracing::debug!("Override crawl.max_pages_per_site from env: {}", pages);
            }
        }

        if let Ok(val) = std::env::var("HARVEST_DELAY_MS") {
            if let Ok(delay) = val.parse() {
                self.crawl.per_request_delay_ms = delay;
                tracing::debug!("Override crawl.per_request_delay_ms from env: {}", delay);
            }
        }

        if let Ok(val) = std::env::var("HARVEST_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("HARVEST_DB_PATH") {
            tracing::debug!("Override database.path from env: {}", val);
            self.database.path = Some(PathBuf::from(val));
        }
    }

    /// Check values that would make a crawl meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.crawl.max_pages_per_site == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crawl.max_pages_per_site".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.crawl.max_concurrent_sites == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crawl.max_concurrent_sites".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.crawl.navigate_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crawl.navigate_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to the default location.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/harvest/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/harvest`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    /// Get the cache directory path.
    ///
    /// Uses XDG base directories: `~/.cache/harvest`
    pub fn cache_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.cache_dir().to_path_buf())
    }

    /// Database file location, explicit or under the data directory.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("harvest.db")),
        }
    }

    /// Screenshot directory, explicit or under the cache directory.
    ///
    /// Falls back to the system temp directory when no cache directory exists.
    #[must_use]
    pub fn screenshot_dir(&self) -> PathBuf {
        if let Some(dir) = &self.browser.screenshot_dir {
            return dir.clone();
        }
        Self::cache_dir().map_or_else(
            |_| std::env::temp_dir().join("harvest-screenshots"),
            |dir| dir.join("screenshots"),
        )
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "harvest", "harvest").ok_or(ConfigError::NoConfigDir)
}

/// Traversal bounds and politeness settings for one site crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Deepest link distance from the seed that is still fetched
    pub max_depth: u32,
    /// Maximum distinct pages fetched per seed
    pub max_pages_per_site: usize,
    /// Delay after every fetch, per site, in milliseconds
    pub per_request_delay_ms: u64,
    /// Deadline for a single page navigation in milliseconds
    pub navigate_timeout_ms: u64,
    /// Sites crawled in parallel within one job
    pub max_concurrent_sites: usize,
}

impl CrawlConfig {
    /// Politeness delay as a `Duration`.
    #[must_use]
    pub fn per_request_delay(&self) -> Duration {
        Duration::from_millis(self.per_request_delay_ms)
    }

    /// Navigation deadline as a `Duration`.
    #[must_use]
    pub fn navigate_timeout(&self) -> Duration {
        Duration::from_millis(self.navigate_timeout_ms)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages_per_site: 10,
            per_request_delay_ms: 1000,
            navigate_timeout_ms: 30_000,
            max_concurrent_sites: 3,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// User agent presented to crawled sites
    pub user_agent: String,
    /// Capture the whole scrollable page rather than the viewport
    pub full_page_screenshots: bool,
    /// Where screenshots are written (defaults under the cache directory)
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            full_page_screenshots: true,
            screenshot_dir: None,
        }
    }
}

/// Progress store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file (defaults under the data directory)
    pub path: Option<PathBuf>,
    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
        }
    }
}

/// Expiry of finished jobs and captured screenshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Jobs older than this many days are deleted by cleanup
    pub job_ttl_days: u32,
    /// Screenshots older than this many hours are deleted by cleanup
    pub screenshot_ttl_hours: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            job_ttl_days: 7,
            screenshot_ttl_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.crawl.max_depth, 2);
        assert_eq!(config.crawl.max_pages_per_site, 10);
        assert_eq!(config.crawl.per_request_delay(), Duration::from_secs(1));
        assert!(config.browser.headless);
        assert_eq!(config.retention.job_ttl_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[crawl]"));
        assert!(toml_str.contains("[browser]"));
        assert!(toml_str.contains("[retention]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.crawl.max_pages_per_site, config.crawl.max_pages_per_site);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.crawl.max_depth = 3;
        config.browser.headless = false;
        config.save_to(&config_path).expect("save config");

        let loaded = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(loaded.crawl.max_depth, 3);
        assert!(!loaded.browser.headless);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().expect("create temp dir");
        let loaded =
            AppConfig::load_from(&tmp.path().join("absent.toml")).expect("load defaults");
        assert_eq!(loaded.crawl.max_pages_per_site, 10);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("HARVEST_MAX_DEPTH", "4");
        std::env::set_var("HARVEST_MAX_PAGES", "25");
        std::env::set_var("HARVEST_HEADLESS", "false");
        std::env::set_var("HARVEST_DB_PATH", "/var/lib/harvest/jobs.db");

        let mut config = AppConfig::default();
        config.apply_env();
        assert_eq!(config.crawl.max_depth, 4);
        assert_eq!(config.crawl.max_pages_per_site, 25);
        assert!(!config.browser.headless);
        assert_eq!(
            config.database_path().expect("database path"),
            PathBuf::from("/var/lib/harvest/jobs.db")
        );

        std::env::remove_var("HARVEST_MAX_DEPTH");
        std::env::remove_var("HARVEST_MAX_PAGES");
        std::env::remove_var("HARVEST_HEADLESS");
        std::env::remove_var("HARVEST_DB_PATH");
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r"
[crawl]
max_pages_per_site = 4

[retention]
job_ttl_days = 1
";

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.crawl.max_pages_per_site, 4);
        assert_eq!(config.retention.job_ttl_days, 1);
        // These should be defaults
        assert_eq!(config.crawl.max_depth, 2);
        assert_eq!(config.crawl.per_request_delay_ms, 1000);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = AppConfig::default();
        config.crawl.max_pages_per_site = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = AppConfig::default();
        config.crawl.max_concurrent_sites = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_screenshot_dir() {
        let mut config = AppConfig::default();
        config.browser.screenshot_dir = Some(PathBuf::from("/srv/shots"));
        assert_eq!(config.screenshot_dir(), PathBuf::from("/srv/shots"));
    }
}
