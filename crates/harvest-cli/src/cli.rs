//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "harvest",
    version,
    about = "Crawl websites for contact emails and social profiles"
)]
pub struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true, env = "HARVEST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl one or more websites and print the job as JSON
    ///
    /// Example: harvest crawl acme.com https://example.org
    Crawl {
        /// Seed URLs; a missing scheme defaults to https
        #[arg(required = true)]
        urls: Vec<String>,

        /// Override the maximum link depth
        #[arg(long)]
        max_depth: Option<u32>,

        /// Override the page budget per site
        #[arg(long)]
        max_pages: Option<usize>,

        /// Override how many sites are crawled at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Print a job and its page progress as JSON
    Status {
        /// Job ID returned by `crawl`
        job_id: String,
    },

    /// List the most recent jobs
    Jobs {
        /// Number of jobs to show
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Delete expired jobs and screenshots
    Cleanup,
}
