//! Shared CSV row access for the allowlist and transaction inputs.
//!
//! Rows are read as raw bytes so that stray non-UTF-8 bytes in columns the
//! pipeline never looks at cannot abort a pass. Only the two address fields
//! are decoded, lossily.

use crate::schemas::AddressPair;
use csv::ByteRecord;
use std::fs::File;
use std::path::Path;

/// Open a delimited file for row-by-row reading.
///
/// Rows may have any number of fields; callers check the positions they need.
pub fn open_rows(path: &Path, has_header: bool) -> std::io::Result<csv::Reader<File>> {
    let file = File::open(path)?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_reader(file))
}

/// Result of pulling a (from, to) pair out of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowPair {
    Pair(AddressPair),
    /// The row has `found` fields but `needed` are required
    TooShort { needed: usize, found: usize },
}

/// Extract the trimmed values at `from_idx` and `to_idx`.
pub fn extract_pair(record: &ByteRecord, from_idx: usize, to_idx: usize) -> RowPair {
    match (record.get(from_idx), record.get(to_idx)) {
        (Some(from), Some(to)) => RowPair::Pair(AddressPair::new(decode(from), decode(to))),
        _ => RowPair::TooShort {
            needed: from_idx.max(to_idx) + 1,
            found: record.len(),
        },
    }
}

fn decode(field: &[u8]) -> String {
    String::from_utf8_lossy(field).trim().to_string()
}

/// One-based line number of a record, 0 if unknown
pub fn line_of(record: &ByteRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_trims_values() {
        let record = ByteRecord::from(vec!["a", "b", " 0xfrom ", "0xto\t"]);
        assert_eq!(
            extract_pair(&record, 2, 3),
            RowPair::Pair(AddressPair::new("0xfrom", "0xto"))
        );
    }

    #[test]
    fn test_extract_reports_short_row() {
        let record = ByteRecord::from(vec!["a", "b", "c"]);
        assert_eq!(
            extract_pair(&record, 5, 6),
            RowPair::TooShort { needed: 7, found: 3 }
        );
    }

    #[test]
    fn test_invalid_bytes_elsewhere_are_ignored() {
        let record = ByteRecord::from(vec![&b"\xff\xfe"[..], b"0xA", b"0xB"]);
        assert_eq!(
            extract_pair(&record, 1, 2),
            RowPair::Pair(AddressPair::new("0xA", "0xB"))
        );
    }
}
