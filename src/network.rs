//! The linkability network and its weight-frequency summary.
//!
//! Weights encode reachability depth. A direct transfer from A to B sets
//! A→B to 1. When B later sends to C, every source that already reaches B
//! with weight w gets an edge to C with weight w + 1. Only one hop is
//! applied per transfer, and only towards sources recorded earlier.

use crate::schemas::Edge;
use std::collections::BTreeMap;

/// Directed weighted graph, one edge per ordered address pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkabilityNetwork {
    buckets: BTreeMap<String, BTreeMap<String, u64>>,
}

impl LinkabilityNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one accepted transfer.
    ///
    /// The direct edge is (re)set to 1 even if it already carried a larger
    /// weight. Propagation then scans every bucket, including `from`'s own,
    /// so a self-transfer A→A ends up with weight 2.
    pub fn record(&mut self, from: &str, to: &str) {
        self.buckets
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), 1);

        // Each bucket only reads and writes itself, so scan order is irrelevant.
        for connections in self.buckets.values_mut() {
            if let Some(&weight) = connections.get(from) {
                connections.insert(to.to_string(), weight + 1);
            }
        }
    }

    pub fn weight(&self, from: &str, to: &str) -> Option<u64> {
        self.buckets.get(from)?.get(to).copied()
    }

    /// Whether `address` has a bucket of outgoing edges
    pub fn has_source(&self, address: &str) -> bool {
        self.buckets.contains_key(address)
    }

    pub fn source_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn edge_count(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// All edges, ordered by source then destination
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.buckets.iter().flat_map(|(from, connections)| {
            connections.iter().map(move |(to, &weight)| Edge {
                from: from.clone(),
                to: to.clone(),
                weight,
            })
        })
    }

    pub fn frequencies(&self) -> FrequencyTable {
        self.edges().map(|e| e.weight).collect()
    }
}

/// Edge weight -> number of edges carrying it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u64, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, weight: u64) {
        *self.counts.entry(weight).or_insert(0) += 1;
    }

    pub fn count(&self, weight: u64) -> usize {
        self.counts.get(&weight).copied().unwrap_or(0)
    }

    /// Sum of all counts, i.e. the number of edges recorded
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn distinct_weights(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.counts.iter().map(|(&w, &n)| (w, n))
    }

    pub fn as_map(&self) -> &BTreeMap<u64, usize> {
        &self.counts
    }

    /// `weight W appears N times`, ascending by weight
    pub fn report_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(weight, count)| format!("weight {} appears {} times", weight, count))
            .collect()
    }
}

impl FromIterator<u64> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut table = Self::new();
        for weight in iter {
            table.record(weight);
        }
        table
    }
}
