//! Blacklist construction.
//!
//! Blacklists are JSON arrays of addresses, one per line. They are read
//! line by line rather than parsed as JSON: quotes and commas are stripped
//! and the bracket lines are dropped.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum BlacklistError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Case-sensitive set of excluded addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    addresses: HashSet<String>,
}

impl Blacklist {
    /// Union every file in `dir` whose name ends with `extension`.
    ///
    /// A missing directory or one without matching files gives an empty list.
    pub fn from_dir(dir: &Path, extension: &str) -> Result<Self, BlacklistError> {
        let mut blacklist = Self::default();

        if !dir.is_dir() {
            warn!("Blacklist directory {:?} not found, using empty blacklist", dir);
            return Ok(blacklist);
        }

        let files = list_files(dir, extension)?;
        for path in &files {
            let part = Self::from_file(path)?;
            debug!("{:?}: {} addresses", path, part.len());
            blacklist.extend(part);
        }

        info!(
            "Loaded {} blacklisted addresses from {} files in {:?}",
            blacklist.len(),
            files.len(),
            dir
        );
        Ok(blacklist)
    }

    pub fn from_file(path: &Path) -> Result<Self, BlacklistError> {
        let io_err = |source| BlacklistError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        Self::parse_lines(BufReader::new(file)).map_err(io_err)
    }

    /// Parse the line-oriented list format from any reader
    pub fn parse_lines<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut addresses = HashSet::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim().replace('"', "");
            if line.is_empty() || line == "[" || line == "]" {
                continue;
            }
            addresses.insert(line.replace(',', ""));
        }

        Ok(Self { addresses })
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn extend(&mut self, other: Blacklist) {
        self.addresses.extend(other.addresses);
    }
}

impl<S: Into<String>> FromIterator<S> for Blacklist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Files directly under `dir` whose name ends with `extension`, any case, sorted
fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, BlacklistError> {
    let io_err = |source| BlacklistError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let suffix = extension.to_lowercase();

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .map(|name| name.to_string_lossy().to_lowercase().ends_with(&suffix))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    Ok(files)
}
