mod cli;

use scenegrab::{config, feed, pipeline};

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands, LedgerCommand};
use scenegrab_db::open_ledger;
use scenegrab_parser::{clean_filename, sanitize, Stoplist};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "scenegrab=trace,scenegrab_db=debug,scenegrab_parser=debug,scenegrab_common=debug".to_string()
        } else {
            "scenegrab=debug,scenegrab_db=info,scenegrab_parser=info".to_string()
        }
    });

    // Logs go to stderr so feed output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            dry_run,
            no_window,
            feed,
        } => {
            let options = pipeline::RunOptions {
                dry_run,
                no_window,
                feed,
            };
            run(config_path, options)
        }
        Commands::Normalize { names } => normalize(config_path, &names),
        Commands::Ledger { action } => ledger(config_path, action),
        Commands::GenerateFeed { page_url, output } => {
            generate_feed(config_path, &page_url, output.as_deref())
        }
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("scenegrab {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run(config_path: Option<&Path>, options: pipeline::RunOptions) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pipeline = pipeline::Pipeline::from_config(config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(pipeline.run(&options))?;

    if options.dry_run {
        println!("[DRY RUN] {} release(s) accepted", summary.accepted);
        for job in &summary.jobs {
            println!("  {} -> {}", job.url, job.local_path.display());
        }
        return Ok(());
    }

    if let Some(report) = summary.fetch {
        println!(
            "{} downloaded, {} already present, {} failed",
            report.downloaded.len(),
            report.already_present.len(),
            report.failed.len()
        );
        for (path, error) in &report.failed {
            println!("  failed: {} ({})", path.display(), error);
        }
    }

    Ok(())
}

fn normalize(config_path: Option<&Path>, names: &[String]) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let stoplist = match &config.filter.stoplist {
        Some(path) => Stoplist::load(path)?,
        None => Stoplist::default(),
    };

    for name in names {
        println!("{}", name);
        let key = sanitize(name);
        if key.is_special() {
            println!("  key:      {} (special)", key);
        } else {
            println!("  key:      {}", key);
        }
        match clean_filename(name, &stoplist) {
            Some(clean) => {
                println!("  folder:   {}", clean.folder);
                println!("  filename: {}", clean.filename);
            }
            None => println!("  filename: (unparseable)"),
        }
    }

    Ok(())
}

fn ledger(config_path: Option<&Path>, action: LedgerCommand) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ledger = open_ledger(config.ledger.backend, &config.ledger.path)?;

    match action {
        LedgerCommand::List => {
            for raw in ledger.all()? {
                let key = sanitize(&raw);
                match ledger.seen_at(&key)? {
                    Some(at) => println!("{}\t{}", key, at.to_rfc3339()),
                    None => println!("{}", key),
                }
            }
        }
        LedgerCommand::Mark { titles } => {
            let now = Utc::now();
            for title in titles {
                let key = sanitize(&title);
                if ledger.insert(&key, now)? {
                    println!("marked {}", key);
                } else {
                    println!("already seen {}", key);
                }
            }
        }
        LedgerCommand::Rebuild => {
            ledger.compact()?;
            println!(
                "Rebuilt {:?} ({} keys)",
                config.ledger.path,
                ledger.all()?.len()
            );
        }
    }

    Ok(())
}

fn generate_feed(config_path: Option<&Path>, page_url: &str, output: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let profile = config.filter.quality_profile();
    let client = pipeline::build_session()?;

    let rt = tokio::runtime::Runtime::new()?;
    let xml = rt.block_on(feed::generate::generate_feed(&client, page_url, &profile))?;

    match output {
        Some(path) => {
            std::fs::write(path, &xml)?;
            println!("Wrote feed to {:?}", path);
        }
        None => println!("{}", xml),
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Feed: {}", config.feed.url.as_deref().unwrap_or("(not set)"));
    println!(
        "  Recency window: {}",
        if config.feed.enforce_window {
            format!("{}h", config.feed.recency_hours)
        } else {
            "disabled".to_string()
        }
    );
    println!("  Watchlist: {:?}", config.filter.watchlist);
    println!("  Download dir: {:?}", config.paths.download_dir);
    println!("  Ledger: {:?} ({:?})", config.ledger.path, config.ledger.backend);
    println!("  Max concurrent downloads: {}", config.download.max_concurrent);
    println!("  Commit policy: {:?}", config.download.commit_policy);

    Ok(())
}
