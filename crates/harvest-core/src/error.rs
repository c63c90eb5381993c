//! Core error types for the Harvest crawler.
//!
//! `HarvestError` covers invalid identifiers and values in the shared data
//! model; subsystem crates keep their own error enums and convert into it
//! where they cross into core types.

use thiserror::Error;

/// Errors raised by the shared data model.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// A job ID that is not a UUID v4
    #[error("invalid job ID '{0}': expected a UUID v4")]
    InvalidJobId(String),

    /// A status string outside the known set
    #[error("unknown {kind} status '{value}'")]
    UnknownStatus {
        /// `job` or `page`
        kind: &'static str,
        /// Offending value
        value: String,
    },

    /// A stored timestamp that is not RFC 3339
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),

    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage failure reported by the persistence layer
    #[error("database error: {0}")]
    Database(String),
}

/// Errors loading, validating or saving `AppConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No platform config directory (XDG base directories unavailable)
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Malformed TOML
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Reading or writing the config file failed
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value that would make crawling meaningless
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `crawl.max_pages_per_site`
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type alias using `HarvestError`.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
