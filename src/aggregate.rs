//! Network aggregation module.
//!
//! Streams the transaction dataset once, filters every row against the
//! blacklist and the allowlist, and feeds the survivors into a
//! [`LinkabilityNetwork`]. The finished network is written as a
//! `from,to,weight` edge list.

use crate::allowlist::Allowlist;
use crate::blacklist::Blacklist;
use crate::config::MalformedRowPolicy;
use crate::network::{FrequencyTable, LinkabilityNetwork};
use crate::reader::{extract_pair, line_of, open_rows, RowPair};
use crate::schemas::{Edge, EDGE_HEADER};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed transaction row at line {line}: needs {needed} fields, found {found}")]
    MalformedRow {
        line: u64,
        needed: usize,
        found: usize,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// How to read the transaction dataset
#[derive(Debug, Clone, Copy)]
pub struct TransactionOptions {
    pub from_column: usize,
    pub to_column: usize,
    pub has_header: bool,
    pub malformed_rows: MalformedRowPolicy,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            from_column: 5,
            to_column: 6,
            has_header: false,
            malformed_rows: MalformedRowPolicy::Fail,
        }
    }
}

/// Per-row outcome counters of one aggregation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rows_blacklisted: usize,
    pub rows_not_allowlisted: usize,
    pub rows_malformed: usize,
}

/// What a single row did to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted,
    Blacklisted,
    NotAllowlisted,
}

/// Owns the network for the duration of one pass over the transactions
pub struct Aggregator<'a> {
    allowlist: &'a Allowlist,
    blacklist: &'a Blacklist,
    network: LinkabilityNetwork,
    stats: AggregationStats,
}

impl<'a> Aggregator<'a> {
    pub fn new(allowlist: &'a Allowlist, blacklist: &'a Blacklist) -> Self {
        Self {
            allowlist,
            blacklist,
            network: LinkabilityNetwork::new(),
            stats: AggregationStats::default(),
        }
    }

    /// Apply one transfer; the blacklist is checked before the allowlist
    pub fn process(&mut self, from: &str, to: &str) -> RowOutcome {
        self.stats.rows_read += 1;

        if self.blacklist.contains(from) || self.blacklist.contains(to) {
            self.stats.rows_blacklisted += 1;
            return RowOutcome::Blacklisted;
        }
        if !self.allowlist.contains(from, to) {
            self.stats.rows_not_allowlisted += 1;
            return RowOutcome::NotAllowlisted;
        }

        self.network.record(from, to);
        self.stats.rows_accepted += 1;
        RowOutcome::Accepted
    }

    /// Stream every row of `path` through [`Aggregator::process`]
    pub fn process_file(
        &mut self,
        path: &Path,
        options: TransactionOptions,
    ) -> Result<(), AggregationError> {
        info!("Aggregating transactions from {:?}", path);

        let mut reader = open_rows(path, options.has_header)?;

        for record in reader.byte_records() {
            let record = record?;

            match extract_pair(&record, options.from_column, options.to_column) {
                RowPair::Pair(pair) => {
                    self.process(&pair.from, &pair.to);
                }
                RowPair::TooShort { needed, found } => {
                    let line = line_of(&record);
                    if options.malformed_rows == MalformedRowPolicy::Fail {
                        return Err(AggregationError::MalformedRow {
                            line,
                            needed,
                            found,
                        });
                    }
                    warn!("Skipping transaction line {}: {} of {} fields", line, found, needed);
                    self.stats.rows_read += 1;
                    self.stats.rows_malformed += 1;
                }
            }

            if self.stats.rows_read % 100_000 == 0 {
                debug!(
                    "Processed {} rows, {} edges so far",
                    self.stats.rows_read,
                    self.network.edge_count()
                );
            }
        }

        info!(
            "Read {} rows: {} accepted, {} blacklisted, {} not allowlisted, {} malformed",
            self.stats.rows_read,
            self.stats.rows_accepted,
            self.stats.rows_blacklisted,
            self.stats.rows_not_allowlisted,
            self.stats.rows_malformed
        );
        Ok(())
    }

    pub fn network(&self) -> &LinkabilityNetwork {
        &self.network
    }

    pub fn stats(&self) -> AggregationStats {
        self.stats
    }

    /// End the pass, handing the network over for emission
    pub fn finish(self) -> (LinkabilityNetwork, AggregationStats) {
        (self.network, self.stats)
    }
}

/// Write the edge list and build the frequency table in the same walk
pub fn write_edges_csv(
    network: &LinkabilityNetwork,
    output_path: &Path,
) -> Result<FrequencyTable, AggregationError> {
    let file = std::fs::File::create(output_path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(EDGE_HEADER)?;

    let mut frequencies = FrequencyTable::new();
    for edge in network.edges() {
        let weight = edge.weight.to_string();
        writer.write_record([edge.from.as_str(), edge.to.as_str(), weight.as_str()])?;
        frequencies.record(edge.weight);
    }
    writer.flush()?;

    info!("Wrote {} edges to {:?}", frequencies.total(), output_path);
    Ok(frequencies)
}

/// Read an edge list written by [`write_edges_csv`]
pub fn read_edges_csv(path: &Path) -> Result<Vec<Edge>, AggregationError> {
    let mut reader = open_rows(path, true)?;

    let headers = reader.headers()?.clone();
    if headers.iter().ne(EDGE_HEADER) {
        return Err(AggregationError::InvalidData(format!(
            "unexpected edge header {:?} in {:?}",
            headers, path
        )));
    }

    let mut result = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(record.as_byte_record());
        let field = |i: usize| {
            record.get(i).ok_or(AggregationError::MalformedRow {
                line,
                needed: EDGE_HEADER.len(),
                found: record.len(),
            })
        };

        let weight = field(2)?.parse::<u64>().map_err(|_| {
            AggregationError::InvalidData(format!("bad weight at line {}", line))
        })?;
        result.push(Edge {
            from: field(0)?.to_string(),
            to: field(1)?.to_string(),
            weight,
        });
    }

    Ok(result)
}
