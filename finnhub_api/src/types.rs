//! Response types for the Finnhub endpoints used by the matcher.

use serde::{Deserialize, Serialize};

/// One row of `/stock/symbol`.
///
/// Finnhub returns empty strings rather than nulls for most missing fields,
/// so every field defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockSymbol {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display_symbol: String,
    #[serde(default, rename = "type")]
    pub symbol_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub figi: Option<String>,
    #[serde(default)]
    pub mic: Option<String>,
}

/// Company profile from `/stock/profile`.
///
/// An unknown identifier yields `{}`, which deserializes to a profile with
/// every field `None`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub ticker: Option<String>,
    pub exchange: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub isin: Option<String>,
    pub cusip: Option<String>,
    pub finnhub_industry: Option<String>,
    pub gsector: Option<String>,
    pub weburl: Option<String>,
    pub ipo: Option<String>,
}

impl CompanyProfile {
    /// True when Finnhub returned no data for the lookup.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.ticker.is_none()
    }
}
