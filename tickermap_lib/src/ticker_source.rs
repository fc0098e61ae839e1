//! Ticker records: conversion from Finnhub symbols and local files.

use finnhub_api::types::StockSymbol;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TickerSourceError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One exchange-listed symbol to be mapped.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TickerRecord {
    pub symbol: String,
    pub description: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub symbol_type: Option<String>,
}

impl TickerRecord {
    pub fn new(symbol: &str, description: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            description: description.to_string(),
            symbol_type: None,
        }
    }

    pub fn with_type(mut self, symbol_type: &str) -> Self {
        self.symbol_type = Some(symbol_type.to_string());
        self
    }
}

impl From<StockSymbol> for TickerRecord {
    fn from(s: StockSymbol) -> Self {
        Self {
            symbol: s.symbol.trim().to_string(),
            description: s.description.trim().to_string(),
            symbol_type: s
                .symbol_type
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }
}

/// Keep the first record for each symbol, dropping records with no symbol.
pub fn dedupe_tickers(records: impl IntoIterator<Item = TickerRecord>) -> Vec<TickerRecord> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        if record.symbol.is_empty() {
            tracing::warn!(description = %record.description, "ticker record without symbol; ignoring");
            continue;
        }
        if !seen.insert(record.symbol.clone()) {
            tracing::warn!(symbol = %record.symbol, "duplicate ticker symbol; keeping first record");
            continue;
        }
        out.push(record);
    }
    out
}

/// Convert a Finnhub symbol listing into deduplicated ticker records.
pub fn from_finnhub(symbols: Vec<StockSymbol>) -> Vec<TickerRecord> {
    dedupe_tickers(symbols.into_iter().map(TickerRecord::from))
}

/// Parse a CSV with `symbol,description[,type]` columns.
pub fn parse_tickers_csv<R: Read>(reader: R) -> Result<Vec<TickerRecord>, TickerSourceError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize::<TickerRecord>() {
        let mut row = row?;
        row.symbol_type = row.symbol_type.filter(|t| !t.is_empty());
        records.push(row);
    }
    Ok(dedupe_tickers(records))
}

/// Parse a JSON array in the Finnhub `/stock/symbol` shape.
pub fn parse_tickers_json(content: &str) -> Result<Vec<TickerRecord>, TickerSourceError> {
    let symbols: Vec<StockSymbol> = serde_json::from_str(content)?;
    Ok(from_finnhub(symbols))
}

/// Load tickers from a file, choosing the format by extension (`.json`, else CSV).
pub fn load_tickers(path: impl AsRef<Path>) -> Result<Vec<TickerRecord>, TickerSourceError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        parse_tickers_json(&std::fs::read_to_string(path)?)
    } else {
        parse_tickers_csv(std::fs::File::open(path)?)
    }
}
