//! Harvest Database Layer
//!
//! Persists crawl jobs and per-page progress in `SQLite` through `SQLx`.
//!
//! # Architecture
//!
//! - **Jobs**: one row per submitted job, results stored as JSON once finished
//! - **Page visits**: one row per `(job, url)`, upserted as the crawl progresses
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//! - **Retention**: expired jobs are deleted together with their page rows
//!
//! # Example
//!
//! ```ignore
//! use harvest_db::Database;
//!
//! let db = Database::open("harvest.db", 5).await?;
//! let recent = harvest_db::jobs::list_recent(db.pool(), 10).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cleanup;
pub mod connection;
pub mod error;
pub mod jobs;
pub mod migrations;
pub mod page_visits;

// Re-export commonly used types
pub use connection::ConnectionPool;
pub use error::{DatabaseError, Result};

use std::path::Path;

/// High-level database interface.
///
/// Wraps a [`ConnectionPool`]; cloning shares the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Open the database at `path` (or `:memory:`).
    pub async fn new(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let pool = ConnectionPool::new(path, max_connections).await?;
        Ok(Self { pool })
    }

    /// Open the database and bring its schema up to date.
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let db = Self::new(path, max_connections).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
