//! Configuration management for the linkability pipeline.
//!
//! Supports loading from environment variables, config files, and CLI arguments.

use crate::aggregate::TransactionOptions;
use crate::allowlist::AllowlistOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input and output locations
    #[serde(default)]
    pub paths: PathConfig,

    /// Field positions inside the CSV inputs
    #[serde(default)]
    pub columns: ColumnConfig,

    /// Row parsing behaviour
    #[serde(default)]
    pub parsing: ParsingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Collection ownership/transfer CSV the allowed pairs come from
    #[serde(default = "default_allowlist_file")]
    pub allowlist_file: PathBuf,

    /// Directory holding the blacklist files
    #[serde(default = "default_blacklist_dir")]
    pub blacklist_dir: PathBuf,

    /// Extension (case-insensitive) a file needs to count as a blacklist
    #[serde(default = "default_blacklist_extension")]
    pub blacklist_extension: String,

    /// Main transaction dataset
    #[serde(default = "default_transactions_file")]
    pub transactions_file: PathBuf,

    /// Edge list output
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            allowlist_file: default_allowlist_file(),
            blacklist_dir: default_blacklist_dir(),
            blacklist_extension: default_blacklist_extension(),
            transactions_file: default_transactions_file(),
            output_file: default_output_file(),
            metadata_dir: default_metadata_dir(),
        }
    }
}

/// Zero-based field indices
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnConfig {
    #[serde(default = "default_allowlist_from")]
    pub allowlist_from: usize,

    #[serde(default = "default_allowlist_to")]
    pub allowlist_to: usize,

    #[serde(default = "default_transaction_from")]
    pub transaction_from: usize,

    #[serde(default = "default_transaction_to")]
    pub transaction_to: usize,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            allowlist_from: default_allowlist_from(),
            allowlist_to: default_allowlist_to(),
            transaction_from: default_transaction_from(),
            transaction_to: default_transaction_to(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Discard the first row of the allowlist file
    #[serde(default = "default_true")]
    pub allowlist_has_header: bool,

    /// Discard the first row of the transaction file
    #[serde(default)]
    pub transactions_have_header: bool,

    /// What to do with rows that lack the configured fields
    #[serde(default)]
    pub malformed_rows: MalformedRowPolicy,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            allowlist_has_header: true,
            transactions_have_header: false,
            malformed_rows: MalformedRowPolicy::default(),
        }
    }
}

/// Handling of rows with fewer fields than the configured positions need
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Abort the run on the first short row
    #[default]
    Fail,
    /// Skip the row, count it and keep going
    Skip,
}

// Default value functions
fn default_allowlist_file() -> PathBuf {
    PathBuf::from("boredapeyachtclub.csv")
}

fn default_blacklist_dir() -> PathBuf {
    PathBuf::from("blacklist")
}

fn default_blacklist_extension() -> String {
    ".json".to_string()
}

fn default_transactions_file() -> PathBuf {
    PathBuf::from("prog3ETNsample.csv")
}

fn default_output_file() -> PathBuf {
    PathBuf::from("output.csv")
}

fn default_metadata_dir() -> PathBuf {
    PathBuf::from("metadata")
}

fn default_allowlist_from() -> usize {
    4
}

fn default_allowlist_to() -> usize {
    5
}

fn default_transaction_from() -> usize {
    5
}

fn default_transaction_to() -> usize {
    6
}

fn default_true() -> bool {
    true
}

impl PipelineConfig {
    /// Load configuration from defaults plus environment overrides
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load from a TOML config file with environment overrides
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = ::toml::from_str(&contents)?;

        // Environment variables override file settings
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("LINKNET_ALLOWLIST") {
            self.paths.allowlist_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("LINKNET_BLACKLIST_DIR") {
            self.paths.blacklist_dir = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("LINKNET_TRANSACTIONS") {
            self.paths.transactions_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("LINKNET_OUTPUT") {
            self.paths.output_file = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.columns.allowlist_from == self.columns.allowlist_to {
            anyhow::bail!(
                "allowlist from/to columns must differ (both are {})",
                self.columns.allowlist_from
            );
        }
        if self.columns.transaction_from == self.columns.transaction_to {
            anyhow::bail!(
                "transaction from/to columns must differ (both are {})",
                self.columns.transaction_from
            );
        }
        if self.paths.blacklist_extension.trim().is_empty() {
            anyhow::bail!("blacklist_extension must not be empty");
        }
        Ok(())
    }

    pub fn allowlist_options(&self) -> AllowlistOptions {
        AllowlistOptions {
            from_column: self.columns.allowlist_from,
            to_column: self.columns.allowlist_to,
            has_header: self.parsing.allowlist_has_header,
            malformed_rows: self.parsing.malformed_rows,
        }
    }

    pub fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions {
            from_column: self.columns.transaction_from,
            to_column: self.columns.transaction_to,
            has_header: self.parsing.transactions_have_header,
            malformed_rows: self.parsing.malformed_rows,
        }
    }

    /// Where the run metadata JSON is written
    pub fn metadata_path(&self) -> PathBuf {
        self.paths.metadata_dir.join("run_metadata.json")
    }

    /// Ensure all output directories exist
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.paths.output_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::create_dir_all(&self.paths.metadata_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns() {
        let columns = ColumnConfig::default();
        assert_eq!((columns.allowlist_from, columns.allowlist_to), (4, 5));
        assert_eq!((columns.transaction_from, columns.transaction_to), (5, 6));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [paths]
            transactions_file = "chunks/etn.csv"

            [parsing]
            malformed_rows = "skip"
            "#,
        )
        .unwrap();

        assert_eq!(config.paths.transactions_file, PathBuf::from("chunks/etn.csv"));
        assert_eq!(config.paths.allowlist_file, PathBuf::from("boredapeyachtclub.csv"));
        assert_eq!(config.paths.blacklist_extension, ".json");
        assert!(config.parsing.allowlist_has_header);
        assert!(!config.parsing.transactions_have_header);
        assert_eq!(config.parsing.malformed_rows, MalformedRowPolicy::Skip);
        assert_eq!(config.columns, ColumnConfig::default());
    }

    #[test]
    fn test_validate_rejects_same_columns() {
        let mut config = PipelineConfig::default();
        config.columns.transaction_to = config.columns.transaction_from;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_extension() {
        let mut config = PipelineConfig::default();
        config.paths.blacklist_extension = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
