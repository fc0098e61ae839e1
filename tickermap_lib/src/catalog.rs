//! Internal company catalog: loading and validation.
//!
//! The catalog is a read-only snapshot for the whole run. It can come from
//! CSV (`id,name,slug`) or JSON, either as an array of entries or as an
//! object keyed by company ID (the shape of a realtime-database export).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog is empty")]
    Empty,
    #[error("catalog entry at position {0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate catalog id: {0}")]
    DuplicateId(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog CSV is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("unsupported catalog JSON shape: expected an array or an object keyed by id")]
    UnsupportedShape,
}

/// One company in the internal catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CatalogEntry {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            slug: None,
        }
    }
}

/// Check the catalog is non-empty and ids are non-empty and unique.
pub fn validate_catalog(entries: &[CatalogEntry]) -> Result<(), CatalogError> {
    if entries.is_empty() {
        return Err(CatalogError::Empty);
    }
    let mut seen = HashSet::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        if entry.id.trim().is_empty() {
            return Err(CatalogError::EmptyId(idx));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(CatalogError::DuplicateId(entry.id.clone()));
        }
    }
    Ok(())
}

/// Drop entries without a usable name, logging each.
fn drop_nameless(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    entries
        .into_iter()
        .filter(|e| {
            let keep = !e.name.trim().is_empty();
            if !keep {
                tracing::warn!(id = %e.id, "catalog entry has no name; ignoring");
            }
            keep
        })
        .collect()
}

/// Parse catalog CSV. Header names are matched case-insensitively; `id`
/// and `name` are required, `slug` is optional.
pub fn parse_catalog_csv<R: Read>(reader: R) -> Result<Vec<CatalogEntry>, CatalogError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let id_col = column("id").ok_or(CatalogError::MissingColumn("id"))?;
    let name_col = column("name").ok_or(CatalogError::MissingColumn("name"))?;
    let slug_col = column("slug");

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let slug = slug_col
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        entries.push(CatalogEntry {
            id: record.get(id_col).unwrap_or_default().to_string(),
            name: record.get(name_col).unwrap_or_default().to_string(),
            slug,
        });
    }
    let entries = drop_nameless(entries);
    validate_catalog(&entries)?;
    Ok(entries)
}

/// Parse catalog JSON. Objects keyed by id read the name from `name_field`.
pub fn parse_catalog_json(content: &str, name_field: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let entries = match value {
        serde_json::Value::Array(_) => serde_json::from_value::<Vec<CatalogEntry>>(value)?,
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter_map(|(id, data)| {
                let data = data.as_object()?;
                let name = data.get(name_field)?.as_str()?.trim().to_string();
                let slug = data
                    .get("slug")
                    .and_then(|s| s.as_str())
                    .map(str::to_string);
                Some(CatalogEntry { id, name, slug })
            })
            .collect(),
        _ => return Err(CatalogError::UnsupportedShape),
    };
    let entries = drop_nameless(entries);
    validate_catalog(&entries)?;
    Ok(entries)
}

/// Load a catalog file, choosing the format by extension (`.json`, else CSV).
pub fn load_catalog(path: impl AsRef<Path>, name_field: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let content = std::fs::read_to_string(path)?;
        parse_catalog_json(&content, name_field)
    } else {
        let file = std::fs::File::open(path)?;
        parse_catalog_csv(file)
    }
}
