use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scenegrab")]
#[command(author, version, about = "Release feed watcher that resolves, downloads and renames episodic media")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one pass over the feed
    Run {
        /// Resolve links and print the planned downloads without fetching
        #[arg(long)]
        dry_run: bool,

        /// Ignore the recency window for this run
        #[arg(long)]
        no_window: bool,

        /// Feed URL or file, overriding the configured one
        #[arg(long)]
        feed: Option<String>,
    },

    /// Print the canonical key and clean filename for release names
    Normalize {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Inspect or edit the seen ledger
    Ledger {
        #[command(subcommand)]
        action: LedgerCommand,
    },

    /// Scrape a release listing page into an RSS feed
    GenerateFeed {
        /// Listing page URL
        page_url: String,

        /// Write the feed here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum LedgerCommand {
    /// Print every key, sorted
    List,

    /// Mark titles as seen
    Mark {
        #[arg(required = true)]
        titles: Vec<String>,
    },

    /// Re-normalize and rewrite the ledger
    Rebuild,
}
