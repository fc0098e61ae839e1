//! Minimal client for the Finnhub stock-symbol and company-profile endpoints.

mod client;
mod errors;
pub mod types;

pub use self::client::{Client, ProfileLookup};
pub use self::errors::Error;
