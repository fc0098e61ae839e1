//! Flat mapping files: `{ "TICKER": "company_id", ... }` JSON and CSV.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::store::{MappingEntry, MatchType};

#[derive(Error, Debug)]
pub enum MappingFileError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ticker -> company id, ordered by ticker.
pub fn to_map(entries: &[MappingEntry]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|e| (e.ticker.clone(), e.company_id.clone()))
        .collect()
}

pub fn write_json<W: Write>(entries: &[MappingEntry], writer: W) -> Result<(), MappingFileError> {
    serde_json::to_writer_pretty(writer, &to_map(entries))?;
    Ok(())
}

/// Full rows, including match type, score and timestamp.
pub fn write_csv<W: Write>(entries: &[MappingEntry], writer: W) -> Result<(), MappingFileError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parse a flat JSON mapping. Blank tickers or ids are dropped; tickers are
/// trimmed. Entries carry `MatchType::Imported` and score 100.
pub fn parse_json(content: &str) -> Result<Vec<MappingEntry>, MappingFileError> {
    let raw: BTreeMap<String, String> = serde_json::from_str(content)?;
    let entries = raw
        .iter()
        .filter_map(|(ticker, id)| {
            let (ticker, id) = (ticker.trim(), id.trim());
            if ticker.is_empty() || id.is_empty() {
                tracing::warn!(ticker, "skipping blank mapping");
                return None;
            }
            Some(MappingEntry::new(ticker, id, MatchType::Imported, 100.0))
        })
        .collect();
    Ok(entries)
}

pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<MappingEntry>, MappingFileError> {
    let content = std::fs::read_to_string(path)?;
    parse_json(&content)
}
