//! NFT Linkability Network Library
//!
//! Builds a weighted, directed "linkability network" out of a transaction
//! dataset, restricted to address pairs seen in an NFT collection's
//! transfer history and excluding blacklisted addresses.
//!
//! # Pipeline Stages
//!
//! 1. **Allowlist** ([`allowlist`]): permitted (from, to) pairs from the collection export
//! 2. **Blacklist** ([`blacklist`]): union of excluded addresses from every list file in a directory
//! 3. **Aggregation** ([`aggregate`]): single pass over the transactions into a [`network::LinkabilityNetwork`]
//! 4. **Emission** ([`aggregate::write_edges_csv`]): `from,to,weight` edge list plus weight frequencies
//!
//! # Output Files
//!
//! - `output.csv`: edge list
//! - `metadata/run_metadata.json`: record counts and weight frequencies of the run
//!
//! # Example
//!
//! ```no_run
//! use linkability_network::config::PipelineConfig;
//! use linkability_network::pipeline::run_pipeline;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::load()?;
//!     let summary = run_pipeline(&config)?;
//!     for line in summary.frequencies.report_lines() {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod allowlist;
pub mod blacklist;
pub mod config;
pub mod network;
pub mod pipeline;
pub mod reader;
pub mod schemas;

// Re-export commonly used types
pub use allowlist::Allowlist;
pub use blacklist::Blacklist;
pub use config::PipelineConfig;
pub use network::{FrequencyTable, LinkabilityNetwork};
pub use schemas::{AddressPair, Edge, RunMetadata};
