//! Allowlist construction.
//!
//! The allowlist is the set of (from, to) pairs seen in the collection's
//! ownership/transfer export. Only transactions between such pairs may
//! become edges of the linkability network.

use crate::config::MalformedRowPolicy;
use crate::reader::{extract_pair, line_of, open_rows, RowPair};
use crate::schemas::AddressPair;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AllowlistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed allowlist row at line {line}: needs {needed} fields, found {found}")]
    MalformedRow {
        line: u64,
        needed: usize,
        found: usize,
    },
}

/// How to read the allowlist export
#[derive(Debug, Clone, Copy)]
pub struct AllowlistOptions {
    pub from_column: usize,
    pub to_column: usize,
    pub has_header: bool,
    pub malformed_rows: MalformedRowPolicy,
}

impl Default for AllowlistOptions {
    fn default() -> Self {
        Self {
            from_column: 4,
            to_column: 5,
            has_header: true,
            malformed_rows: MalformedRowPolicy::Fail,
        }
    }
}

/// Immutable set of permitted address pairs, grouped by source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    by_source: HashMap<String, HashSet<String>>,
    len: usize,
}

impl Allowlist {
    /// Read every data row of `path` into the set
    pub fn from_csv(path: &Path, options: AllowlistOptions) -> Result<Self, AllowlistError> {
        info!("Building allowlist from {:?}", path);

        let mut reader = open_rows(path, options.has_header)?;
        let mut allowlist = Self::default();
        let mut rows = 0usize;
        let mut skipped = 0usize;

        for record in reader.byte_records() {
            let record = record?;
            rows += 1;

            match extract_pair(&record, options.from_column, options.to_column) {
                RowPair::Pair(pair) => allowlist.insert(pair),
                RowPair::TooShort { needed, found } => {
                    let line = line_of(&record);
                    if options.malformed_rows == MalformedRowPolicy::Skip {
                        warn!("Skipping allowlist line {}: {} of {} fields", line, found, needed);
                        skipped += 1;
                        continue;
                    }
                    return Err(AllowlistError::MalformedRow {
                        line,
                        needed,
                        found,
                    });
                }
            }
        }

        debug!("Allowlist rows read: {}, skipped: {}", rows, skipped);
        info!("Allowlist holds {} distinct pairs", allowlist.len());

        Ok(allowlist)
    }

    fn insert(&mut self, pair: AddressPair) {
        if self.by_source.entry(pair.from).or_default().insert(pair.to) {
            self.len += 1;
        }
    }

    /// Probed once per transaction row, without allocating
    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.by_source
            .get(from)
            .map_or(false, |destinations| destinations.contains(to))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = AddressPair> + '_ {
        self.by_source.iter().flat_map(|(from, destinations)| {
            destinations
                .iter()
                .map(move |to| AddressPair::new(from.as_str(), to.as_str()))
        })
    }
}

impl FromIterator<AddressPair> for Allowlist {
    fn from_iter<I: IntoIterator<Item = AddressPair>>(iter: I) -> Self {
        let mut allowlist = Self::default();
        for pair in iter {
            allowlist.insert(pair);
        }
        allowlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_header_is_skipped_and_fields_trimmed() {
        let file = write_csv(
            "hash,block,ts,token,from,to\n\
             0x1,1,2024,7, 0xA , 0xB \n\
             0x2,2,2024,8,0xB,0xC\n",
        );

        let allowlist = Allowlist::from_csv(file.path(), AllowlistOptions::default()).unwrap();

        assert_eq!(allowlist.len(), 2);
        assert!(allowlist.contains("0xA", "0xB"));
        assert!(allowlist.contains("0xB", "0xC"));
        assert!(!allowlist.contains("from", "to"));
        // ordered pairs
        assert!(!allowlist.contains("0xB", "0xA"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let file = write_csv(
            "h0,h1,h2,h3,h4,h5\n\
             a,b,c,d,0xA,0xB\n\
             e,f,g,h,0xA,0xB\n",
        );

        let allowlist = Allowlist::from_csv(file.path(), AllowlistOptions::default()).unwrap();
        assert_eq!(allowlist.len(), 1);
        assert_eq!(allowlist.iter().count(), 1);
    }

    #[test]
    fn test_same_source_many_destinations() {
        let allowlist: Allowlist = [
            AddressPair::new("0xA", "0xB"),
            AddressPair::new("0xA", "0xC"),
            AddressPair::new("0xA", "0xB"),
        ]
        .into_iter()
        .collect();

        assert_eq!(allowlist.len(), 2);
        assert!(allowlist.contains("0xA", "0xC"));
        assert!(!allowlist.contains("0xC", "0xA"));
        assert!(!allowlist.contains("0xD", "0xB"));
    }

    #[test]
    fn test_invalid_utf8_outside_pair_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"h0,h1,h2,h3,h4,h5\na,b,\xff\xfe,d,0xA,0xB\n").unwrap();

        let allowlist = Allowlist::from_csv(file.path(), AllowlistOptions::default()).unwrap();
        assert!(allowlist.contains("0xA", "0xB"));
    }

    #[test]
    fn test_short_row_is_fatal() {
        let file = write_csv("h0,h1,h2,h3,h4,h5\na,b,c,d,0xA\n");

        let err = Allowlist::from_csv(file.path(), AllowlistOptions::default()).unwrap_err();
        match err {
            AllowlistError::MalformedRow { line, needed, found } => {
                assert_eq!(line, 2);
                assert_eq!(needed, 6);
                assert_eq!(found, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_skipped_when_configured() {
        let file = write_csv("h0,h1,h2,h3,h4,h5\na,b,c,d,0xA\na,b,c,d,0xA,0xB\n");
        let options = AllowlistOptions {
            malformed_rows: MalformedRowPolicy::Skip,
            ..AllowlistOptions::default()
        };

        let allowlist = Allowlist::from_csv(file.path(), options).unwrap();
        assert_eq!(allowlist.len(), 1);
        assert!(allowlist.contains("0xA", "0xB"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Allowlist::from_csv(&dir.path().join("absent.csv"), AllowlistOptions::default())
            .unwrap_err();
        assert!(matches!(err, AllowlistError::Io(_)));
    }

    #[test]
    fn test_rebuild_is_identical() {
        let file = write_csv("h0,h1,h2,h3,h4,h5\na,b,c,d,0xA,0xB\na,b,c,d,0xC,0xD\n");

        let first = Allowlist::from_csv(file.path(), AllowlistOptions::default()).unwrap();
        let second = Allowlist::from_csv(file.path(), AllowlistOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
