//! Mapping Store: accumulated ticker -> company ID mappings.
//!
//! Implementations must make every successful `put` durable before
//! returning, so an interrupted run loses nothing it already decided.
//! Stores are not synchronized; callers driving the matcher from several
//! threads must serialize access themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::db::DbError;

/// How a mapping was established.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Fuzzy,
    Manual,
    /// Loaded from a previous run's mapping file.
    Imported,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Manual => "manual",
            Self::Imported => "imported",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "fuzzy" => Ok(Self::Fuzzy),
            "manual" => Ok(Self::Manual),
            "imported" => Ok(Self::Imported),
            other => Err(DbError::UnknownMatchType(other.to_string())),
        }
    }
}

/// One accepted ticker -> company mapping. Never mutated once stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub ticker: String,
    pub company_id: String,
    pub match_type: MatchType,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

impl MappingEntry {
    pub fn new(ticker: &str, company_id: &str, match_type: MatchType, score: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            company_id: company_id.to_string(),
            match_type,
            score,
            created_at: Utc::now(),
        }
    }
}

/// Durable key-value store keyed by ticker.
pub trait MappingStore {
    fn get(&self, ticker: &str) -> Result<Option<MappingEntry>, DbError>;

    /// Insert a new mapping. Fails with `DbError::DuplicateTicker` if the
    /// ticker is already mapped; existing entries are never overwritten.
    fn put(&mut self, entry: MappingEntry) -> Result<(), DbError>;

    /// Tickers currently mapped to `company_id`, oldest first.
    fn owners_of(&self, company_id: &str) -> Result<Vec<String>, DbError>;

    fn has_company_id(&self, company_id: &str) -> Result<bool, DbError> {
        Ok(!self.owners_of(company_id)?.is_empty())
    }

    /// Flush anything not yet durable.
    fn persist(&mut self) -> Result<(), DbError>;

    /// Every mapping, ordered by ticker.
    fn all(&self) -> Result<Vec<MappingEntry>, DbError>;
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, MappingEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from existing entries (e.g. a snapshot of the persistent store).
    pub fn from_entries(entries: impl IntoIterator<Item = MappingEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.ticker.clone(), e))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MappingStore for MemoryStore {
    fn get(&self, ticker: &str) -> Result<Option<MappingEntry>, DbError> {
        Ok(self.entries.get(ticker).cloned())
    }

    fn put(&mut self, entry: MappingEntry) -> Result<(), DbError> {
        if self.entries.contains_key(&entry.ticker) {
            return Err(DbError::DuplicateTicker(entry.ticker));
        }
        self.entries.insert(entry.ticker.clone(), entry);
        Ok(())
    }

    fn owners_of(&self, company_id: &str) -> Result<Vec<String>, DbError> {
        let mut owners: Vec<&MappingEntry> = self
            .entries
            .values()
            .filter(|e| e.company_id == company_id)
            .collect();
        owners.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(owners.into_iter().map(|e| e.ticker.clone()).collect())
    }

    fn persist(&mut self) -> Result<(), DbError> {
        Ok(())
    }

    fn all(&self) -> Result<Vec<MappingEntry>, DbError> {
        Ok(self.entries.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut store = MemoryStore::new();
        store
            .put(MappingEntry::new("AAPL", "apple-id", MatchType::Exact, 100.0))
            .unwrap();
        let entry = store.get("AAPL").unwrap().unwrap();
        assert_eq!(entry.company_id, "apple-id");
        assert_eq!(entry.match_type, MatchType::Exact);
        assert!(store.get("MSFT").unwrap().is_none());
    }

    #[test]
    fn test_put_duplicate_rejected() {
        let mut store = MemoryStore::new();
        store
            .put(MappingEntry::new("AAPL", "apple-id", MatchType::Exact, 100.0))
            .unwrap();
        let result = store.put(MappingEntry::new("AAPL", "other", MatchType::Fuzzy, 95.0));
        assert!(matches!(result, Err(DbError::DuplicateTicker(t)) if t == "AAPL"));
        assert_eq!(store.get("AAPL").unwrap().unwrap().company_id, "apple-id");
    }

    #[test]
    fn test_owners_of() {
        let mut store = MemoryStore::new();
        store
            .put(MappingEntry::new("GOOGL", "alphabet", MatchType::Exact, 100.0))
            .unwrap();
        store
            .put(MappingEntry::new("GOOG", "alphabet", MatchType::Manual, 92.0))
            .unwrap();
        assert_eq!(store.owners_of("alphabet").unwrap().len(), 2);
        assert!(store.has_company_id("alphabet").unwrap());
        assert!(!store.has_company_id("apple").unwrap());
    }

    #[test]
    fn test_match_type_round_trip_str() {
        for mt in [MatchType::Exact, MatchType::Fuzzy, MatchType::Manual, MatchType::Imported] {
            assert_eq!(mt.as_str().parse::<MatchType>().unwrap(), mt);
        }
        assert!("bogus".parse::<MatchType>().is_err());
    }
}
