//! NFT Linkability Network CLI
//!
//! Builds the linkability network of an NFT collection from a transaction
//! dataset and reports how often each edge weight occurs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use linkability_network::aggregate::read_edges_csv;
use linkability_network::config::{MalformedRowPolicy, PipelineConfig};
use linkability_network::pipeline::{build_allowlist, build_blacklist, run_pipeline};
use linkability_network::schemas::RunMetadata;

#[derive(Parser)]
#[command(name = "linkability-network")]
#[command(version)]
#[command(about = "Weighted linkability network of NFT-collection transactions", long_about = None)]
struct Cli {
    /// Path to configuration file (optional, uses defaults and env vars if not provided)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the network, write the edge list and print the weight report
    Run {
        /// Collection transfer CSV the allowed pairs are taken from
        #[arg(short, long)]
        allowlist: Option<PathBuf>,

        /// Directory of blacklist files
        #[arg(short, long)]
        blacklist_dir: Option<PathBuf>,

        /// Transaction dataset
        #[arg(short, long)]
        transactions: Option<PathBuf>,

        /// Edge list output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip rows that lack the from/to fields instead of failing
        #[arg(long)]
        skip_malformed: bool,
    },

    /// Build only the allowlist and report its size
    Allowlist,

    /// Build only the blacklist and report its size
    Blacklist,

    /// Show which inputs and outputs are present
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => PipelineConfig::load().context("Failed to load config from environment")?,
    };

    let command = cli.command.unwrap_or(Commands::Run {
        allowlist: None,
        blacklist_dir: None,
        transactions: None,
        output: None,
        skip_malformed: false,
    });

    match command {
        Commands::Run {
            allowlist,
            blacklist_dir,
            transactions,
            output,
            skip_malformed,
        } => {
            // CLI overrides
            if let Some(path) = allowlist {
                config.paths.allowlist_file = path;
            }
            if let Some(path) = blacklist_dir {
                config.paths.blacklist_dir = path;
            }
            if let Some(path) = transactions {
                config.paths.transactions_file = path;
            }
            if let Some(path) = output {
                config.paths.output_file = path;
            }
            if skip_malformed {
                config.parsing.malformed_rows = MalformedRowPolicy::Skip;
            }
            cmd_run(&config)?;
        }
        Commands::Allowlist => cmd_allowlist(&config)?,
        Commands::Blacklist => cmd_blacklist(&config)?,
        Commands::Status => cmd_status(&config)?,
    }

    Ok(())
}

fn cmd_run(config: &PipelineConfig) -> Result<()> {
    info!("=== Building Linkability Network ===");

    if !config.paths.transactions_file.exists() {
        anyhow::bail!(
            "Transactions file not found: {:?}",
            config.paths.transactions_file
        );
    }
    config.ensure_directories()?;

    let summary = run_pipeline(config)?;

    let metadata_path = config.metadata_path();
    summary.metadata.save(&metadata_path)?;

    let counts = &summary.metadata.record_counts;
    info!(
        "{} allowlisted pairs, {} blacklisted addresses",
        counts.allowlist_pairs, counts.blacklist_addresses
    );
    info!(
        "{} edges written to {:?}",
        counts.edges, config.paths.output_file
    );
    info!("Metadata saved to {:?}", metadata_path);

    for line in summary.frequencies.report_lines() {
        println!("{}", line);
    }

    Ok(())
}

fn cmd_allowlist(config: &PipelineConfig) -> Result<()> {
    info!("=== Allowlist ===");
    let allowlist = build_allowlist(config)?;
    info!(
        "{} distinct pairs in {:?}",
        allowlist.len(),
        config.paths.allowlist_file
    );
    Ok(())
}

fn cmd_blacklist(config: &PipelineConfig) -> Result<()> {
    info!("=== Blacklist ===");
    let blacklist = build_blacklist(config)?;
    if blacklist.is_empty() {
        warn!(
            "No blacklisted addresses found in {:?} (extension {})",
            config.paths.blacklist_dir, config.paths.blacklist_extension
        );
    } else {
        info!(
            "{} distinct addresses in {:?}",
            blacklist.len(),
            config.paths.blacklist_dir
        );
    }
    Ok(())
}

fn cmd_status(config: &PipelineConfig) -> Result<()> {
    info!("=== Pipeline Status ===");

    let files = [
        ("Allowlist", &config.paths.allowlist_file),
        ("Blacklist dir", &config.paths.blacklist_dir),
        ("Transactions", &config.paths.transactions_file),
        ("Edges", &config.paths.output_file),
    ];

    for (name, path) in files {
        if !path.exists() {
            info!("  {} {} {:?}: not found", "✗", name, path);
            continue;
        }

        let metadata = std::fs::metadata(path)?;
        if metadata.is_dir() {
            let entries = std::fs::read_dir(path)?.count();
            info!("  {} {} {:?}: {} entries", "✓", name, path, entries);
        } else if name == "Edges" {
            match read_edges_csv(path) {
                Ok(edges) => info!(
                    "  {} {} {:?}: {} edges ({} KB)",
                    "✓",
                    name,
                    path,
                    edges.len(),
                    metadata.len() / 1024
                ),
                Err(e) => warn!("  {} {} {:?}: unreadable edge list: {}", "✗", name, path, e),
            }
        } else {
            info!("  {} {} {:?}: {} KB", "✓", name, path, metadata.len() / 1024);
        }
    }

    let metadata_path = config.metadata_path();
    match RunMetadata::load(&metadata_path) {
        Ok(run) => info!(
            "Last run {} ({} rows read, {} edges)",
            run.run_timestamp.format("%Y-%m-%d %H:%M:%S"),
            run.record_counts.rows_read,
            run.record_counts.edges
        ),
        Err(_) => info!("  {} {:?}: not found", "✗", metadata_path),
    }

    Ok(())
}
