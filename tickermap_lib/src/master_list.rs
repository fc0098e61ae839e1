//! Validation of a produced mapping against a hand-curated master list.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::store::MappingEntry;

const TICKER_COLUMNS: [&str; 2] = ["ticker", "symbol"];
const COMPANY_COLUMNS: [&str; 3] = ["expected_company_id", "company_id", "companyid"];

#[derive(Error, Debug)]
pub enum MasterListError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no rows found in master list (need columns: ticker, expected_company_id or company_id)")]
    Empty,
}

/// Expected company id per upper-cased ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterList {
    expected: BTreeMap<String, String>,
}

/// A ticker mapped to something other than the expected id.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub ticker: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub total: usize,
    pub correct: usize,
    pub wrong: Vec<Mismatch>,
    /// In the master list but not in the mapping.
    pub missing: Vec<String>,
    /// Percentage of master-list tickers mapped correctly.
    pub accuracy: f64,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.wrong.is_empty()
    }
}

impl MasterList {
    /// Parse CSV with a `ticker`/`symbol` column and an
    /// `expected_company_id`/`company_id`/`companyid` column. Header names
    /// are case-insensitive; rows missing either value are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, MasterListError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let column = |names: &[&str]| -> Vec<usize> {
            names
                .iter()
                .filter_map(|name| headers.iter().position(|h| h == name))
                .collect()
        };
        let ticker_cols = column(&TICKER_COLUMNS[..]);
        let company_cols = column(&COMPANY_COLUMNS[..]);

        let mut expected = BTreeMap::new();
        for record in rdr.records() {
            let record = record?;
            let first = |cols: &[usize]| {
                cols.iter()
                    .filter_map(|&i| record.get(i))
                    .find(|v| !v.is_empty())
                    .map(str::to_string)
            };
            if let (Some(ticker), Some(company_id)) = (first(&ticker_cols[..]), first(&company_cols[..])) {
                expected.insert(ticker.to_uppercase(), company_id);
            }
        }

        if expected.is_empty() {
            return Err(MasterListError::Empty);
        }
        Ok(Self { expected })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MasterListError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn len(&self) -> usize {
        self.expected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    /// Compare a ticker -> company id mapping against the master list.
    /// Tickers and ids are compared case-insensitively after trimming.
    pub fn evaluate(&self, mapping: &BTreeMap<String, String>) -> ValidationReport {
        let by_upper: BTreeMap<String, &str> = mapping
            .iter()
            .map(|(t, id)| (t.trim().to_uppercase(), id.as_str()))
            .collect();

        let mut correct = 0;
        let mut wrong = Vec::new();
        let mut missing = Vec::new();
        for (ticker, expected) in &self.expected {
            match by_upper.get(ticker) {
                None => missing.push(ticker.clone()),
                Some(actual) if actual.trim().eq_ignore_ascii_case(expected.trim()) => correct += 1,
                Some(actual) => wrong.push(Mismatch {
                    ticker: ticker.clone(),
                    expected: expected.clone(),
                    actual: actual.to_string(),
                }),
            }
        }

        let total = self.expected.len();
        let accuracy = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64 * 100.0
        };
        ValidationReport {
            total,
            correct,
            wrong,
            missing,
            accuracy,
        }
    }

    /// Convenience wrapper over stored entries.
    pub fn evaluate_entries(&self, entries: &[MappingEntry]) -> ValidationReport {
        let mapping = entries
            .iter()
            .map(|e| (e.ticker.clone(), e.company_id.clone()))
            .collect();
        self.evaluate(&mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "Ticker,Expected_Company_ID\nAAPL,c1\nmsft,c2\nIGRX,c3\nBKT,c4\n";

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(t, c)| (t.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_headers_case_insensitive() {
        let list = MasterList::from_reader(MASTER.as_bytes()).unwrap();
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_alternate_columns() {
        let csv = "symbol,companyid,notes\nAAPL,c1,x\n,c2,missing ticker\nMSFT,,missing id\n";
        let list = MasterList::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_empty_master_list() {
        let result = MasterList::from_reader("ticker,name\nAAPL,Apple\n".as_bytes());
        assert!(matches!(result, Err(MasterListError::Empty)));
    }

    #[test]
    fn test_evaluate() {
        let list = MasterList::from_reader(MASTER.as_bytes()).unwrap();
        let report = list.evaluate(&mapping(&[
            ("AAPL", "C1"),
            ("MSFT", " c2 "),
            ("IGRX", "c9"),
            ("XYZ", "c5"),
        ]));
        assert_eq!(report.total, 4);
        assert_eq!(report.correct, 2);
        assert_eq!(report.wrong.len(), 1);
        assert_eq!(report.wrong[0].ticker, "IGRX");
        assert_eq!(report.missing, vec!["BKT".to_string()]);
        assert_eq!(report.accuracy, 50.0);
        assert!(!report.passed());
    }

    #[test]
    fn test_lowercase_mapping_keys() {
        let list = MasterList::from_reader("ticker,company_id\nAAPL,c1\n".as_bytes()).unwrap();
        let report = list.evaluate(&mapping(&[("aapl", "c1")]));
        assert!(report.passed());
        assert_eq!(report.accuracy, 100.0);
    }
}
