//! Harvest command-line shell
//!
//! Thin binary that wires configuration, storage and the browser into the
//! crawler crate. Crawl logic lives in the `crates/` libraries.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use harvest_browser::{ChromiumLauncher, ScreenshotStore};
use harvest_core::{AppConfig, JobId, Timestamp};
use harvest_crawler::{
    validate_urls, CrawlSettings, DatabaseSink, JobOrchestrator, ProgressSink,
};
use harvest_db::{cleanup, jobs, Database};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,harvest=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.apply_env();
            config
        }
        None => AppConfig::load_with_env().context("failed to load config")?,
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn open_database(config: &AppConfig) -> Result<Database> {
    let path = config.database_path()?;
    info!("Using database {}", path.display());
    Database::open(&path, config.database.max_connections)
        .await
        .with_context(|| format!("failed to open database {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl {
            urls,
            max_depth,
            max_pages,
            concurrency,
        } => {
            if let Some(depth) = max_depth {
                config.crawl.max_depth = depth;
            }
            if let Some(pages) = max_pages {
                config.crawl.max_pages_per_site = pages;
            }
            if let Some(sites) = concurrency {
                config.crawl.max_concurrent_sites = sites;
            }
            config.validate().context("invalid crawl options")?;
            crawl(&config, &urls).await
        }
        Commands::Status { job_id } => status(&config, &job_id).await,
        Commands::Jobs { limit } => list_jobs(&config, limit).await,
        Commands::Cleanup => run_cleanup(&config).await,
    }
}

async fn crawl(config: &AppConfig, raw_urls: &[String]) -> Result<()> {
    let seeds = validate_urls(raw_urls);
    if seeds.is_empty() {
        anyhow::bail!("no valid http(s) URLs given");
    }

    let db = open_database(config).await?;
    let sink: Arc<dyn ProgressSink> = Arc::new(DatabaseSink::new(db.clone()));
    let store = ScreenshotStore::new(
        config.screenshot_dir(),
        config.browser.full_page_screenshots,
    );
    let orchestrator = JobOrchestrator::new(
        Arc::new(ChromiumLauncher::new(config.browser.clone())),
        Arc::new(store),
        sink.clone(),
        CrawlSettings::from(&config.crawl),
    )
    .with_max_concurrent_sites(config.crawl.max_concurrent_sites);

    let handle = orchestrator.submit(seeds).await?;
    let job_id = handle.job_id().clone();
    let cancel = handle.cancellation_token();
    info!("Job {} started, press Ctrl-C to cancel", job_id);

    let wait = handle.wait();
    tokio::pin!(wait);
    let outcome = tokio::select! {
        outcome = &mut wait => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Cancelling job {}", job_id);
            cancel.cancel();
            wait.await
        }
    };

    let job = sink.get_job(&job_id).await?;
    println!("{}", serde_json::to_string_pretty(&job)?);
    db.close().await;

    outcome.with_context(|| format!("job {job_id} failed"))?;
    Ok(())
}

async fn status(config: &AppConfig, raw_id: &str) -> Result<()> {
    let job_id = JobId::new(raw_id)?;
    let db = open_database(config).await?;
    let sink = DatabaseSink::new(db.clone());

    let job = sink
        .get_job(&job_id)
        .await?
        .with_context(|| format!("job {job_id} not found"))?;
    let pages = sink.page_visits(&job_id).await?;
    db.close().await;

    let report = serde_json::json!({ "job": job, "pages": pages });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn list_jobs(config: &AppConfig, limit: u32) -> Result<()> {
    let db = open_database(config).await?;
    let recent = jobs::list_recent(db.pool(), limit).await?;
    db.close().await;

    for job in recent {
        let sites = job.results.as_ref().map_or(0, |results| results.len());
        println!(
            "{}  {:<10} {}  {}/{} sites",
            job.id,
            job.status.as_str(),
            job.created_at,
            sites,
            job.seed_urls.len()
        );
    }
    Ok(())
}

async fn run_cleanup(config: &AppConfig) -> Result<()> {
    let retention = &config.retention;
    let cutoff: Timestamp =
        (chrono::Utc::now() - chrono::Duration::days(i64::from(retention.job_ttl_days))).into();

    let db = open_database(config).await?;
    let removed_jobs = cleanup::delete_jobs_older_than(db.pool(), cutoff).await?;
    db.close().await;

    let store = ScreenshotStore::new(config.screenshot_dir(), false);
    let max_age = Duration::from_secs(u64::from(retention.screenshot_ttl_hours) * 3600);
    let removed_files = store
        .purge_older_than(max_age)
        .await
        .with_context(|| format!("failed to purge {}", store.dir().display()))?;

    info!(
        "Removed {} jobs older than {} and {} screenshots",
        removed_jobs, cutoff, removed_files
    );
    Ok(())
}
