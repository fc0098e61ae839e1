//! CLI subcommand implementations.

pub mod export;
pub mod import;
pub mod map;
pub mod mappings;
pub mod profile;
pub mod validate;

use anyhow::{bail, Result};

/// API key from the flag, else `FINNHUB_API_KEY` (a `.env` file is loaded
/// at startup).
pub fn finnhub_api_key(flag: Option<&str>) -> Result<String> {
    if let Some(key) = flag.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    match std::env::var("FINNHUB_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => bail!("Finnhub API key required: pass --api-key or set FINNHUB_API_KEY"),
    }
}
