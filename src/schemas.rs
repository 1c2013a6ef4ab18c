//! Data schemas for the linkability pipeline.
//!
//! This module is the canonical definition of the records that flow between
//! the allowlist, the blacklist, the aggregator and the output files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Schema version for tracking changes
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Separator used in the textual `from-to` pair key
pub const PAIR_SEPARATOR: char = '-';

/// Header row of the edge output file
pub const EDGE_HEADER: [&str; 3] = ["from", "to", "weight"];

// ============================================================================
// Address pairs
// ============================================================================

/// Ordered (from, to) pair of opaque address strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressPair {
    pub from: String,
    pub to: String,
}

impl AddressPair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Canonical `from-to` key
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for AddressPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.from, PAIR_SEPARATOR, self.to)
    }
}

// ============================================================================
// Edges
// ============================================================================

/// One emitted edge of the linkability network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub weight: u64,
}

// ============================================================================
// Metadata Schema
// ============================================================================

/// Run metadata for reproducibility and auditing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Schema version used
    pub schema_version: String,

    /// Pipeline run timestamp
    pub run_timestamp: DateTime<Utc>,

    /// Input and output files of the run
    pub inputs: RunInputs,

    /// Record counts by type
    pub record_counts: RecordCounts,

    /// Edge weight -> number of edges with that weight
    pub weight_frequencies: BTreeMap<u64, usize>,

    /// Git commit hash (if available)
    pub git_commit: Option<String>,

    /// Pipeline version
    pub pipeline_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunInputs {
    pub allowlist_file: PathBuf,
    pub blacklist_dir: PathBuf,
    pub transactions_file: PathBuf,
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecordCounts {
    pub allowlist_pairs: usize,
    pub blacklist_addresses: usize,
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rows_blacklisted: usize,
    pub rows_not_allowlisted: usize,
    pub rows_malformed: usize,
    pub edges: usize,
}

impl RunMetadata {
    pub fn new(inputs: RunInputs) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            run_timestamp: Utc::now(),
            inputs,
            record_counts: RecordCounts::default(),
            weight_frequencies: BTreeMap::new(),
            git_commit: get_git_commit(),
            pipeline_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

fn get_git_commit() -> Option<String> {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
}
