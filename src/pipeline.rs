//! End-to-end run: build the lists, aggregate, emit, report.

use crate::aggregate::{write_edges_csv, Aggregator};
use crate::allowlist::Allowlist;
use crate::blacklist::Blacklist;
use crate::config::PipelineConfig;
use crate::network::FrequencyTable;
use crate::schemas::{RecordCounts, RunInputs, RunMetadata};
use anyhow::{Context, Result};
use tracing::info;

/// Result of a full run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frequencies: FrequencyTable,
    pub metadata: RunMetadata,
}

pub fn build_allowlist(config: &PipelineConfig) -> Result<Allowlist> {
    Allowlist::from_csv(&config.paths.allowlist_file, config.allowlist_options())
        .with_context(|| format!("Failed to build allowlist from {:?}", config.paths.allowlist_file))
}

pub fn build_blacklist(config: &PipelineConfig) -> Result<Blacklist> {
    Blacklist::from_dir(&config.paths.blacklist_dir, &config.paths.blacklist_extension)
        .with_context(|| format!("Failed to build blacklist from {:?}", config.paths.blacklist_dir))
}

/// Run the whole pipeline and write the edge list to the configured output.
///
/// The metadata file is not written here; see [`RunMetadata::save`].
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunSummary> {
    let allowlist = build_allowlist(config)?;
    let blacklist = build_blacklist(config)?;

    let mut aggregator = Aggregator::new(&allowlist, &blacklist);
    aggregator
        .process_file(&config.paths.transactions_file, config.transaction_options())
        .with_context(|| {
            format!(
                "Failed to aggregate transactions from {:?}",
                config.paths.transactions_file
            )
        })?;
    let (network, stats) = aggregator.finish();

    info!(
        "Network has {} sources and {} edges",
        network.source_count(),
        network.edge_count()
    );

    let frequencies = write_edges_csv(&network, &config.paths.output_file)
        .with_context(|| format!("Failed to write edges to {:?}", config.paths.output_file))?;

    let mut metadata = RunMetadata::new(RunInputs {
        allowlist_file: config.paths.allowlist_file.clone(),
        blacklist_dir: config.paths.blacklist_dir.clone(),
        transactions_file: config.paths.transactions_file.clone(),
        output_file: config.paths.output_file.clone(),
    });
    metadata.record_counts = RecordCounts {
        allowlist_pairs: allowlist.len(),
        blacklist_addresses: blacklist.len(),
        rows_read: stats.rows_read,
        rows_accepted: stats.rows_accepted,
        rows_blacklisted: stats.rows_blacklisted,
        rows_not_allowlisted: stats.rows_not_allowlisted,
        rows_malformed: stats.rows_malformed,
        edges: frequencies.total(),
    };
    metadata.weight_frequencies = frequencies.as_map().clone();

    Ok(RunSummary {
        frequencies,
        metadata,
    })
}
