//! HTTP client for the Finnhub REST API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    types::{CompanyProfile, StockSymbol},
    Error,
};

/// Request timeout for Finnhub calls. The full US symbol list is large.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifier accepted by the profile endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileLookup {
    Symbol(String),
    Isin(String),
    Cusip(String),
}

impl ProfileLookup {
    fn query_pair(&self) -> (&'static str, &str) {
        match self {
            Self::Symbol(v) => ("symbol", v),
            Self::Isin(v) => ("isin", v),
            Self::Cusip(v) => ("cusip", v),
        }
    }
}

/// HTTP client for the Finnhub API.
pub struct Client {
    /// Base URL for the API. Defaults to `https://finnhub.io/api/v1`.
    base_api_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client pointing at the production Finnhub API.
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::with_base_url("https://finnhub.io/api/v1", api_key)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }

    fn get_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("token", &self.api_key);
        }
        Ok(url)
    }

    async fn get<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.get_url(path, params)?;
        let resp = self
            .http
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::InvalidApiKey);
        }

        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Parse(e.to_string())
        })
    }

    /// Fetches every listed symbol on an exchange (e.g. `US`).
    pub async fn get_symbols(&self, exchange: &str) -> Result<Vec<StockSymbol>, Error> {
        self.get::<Vec<StockSymbol>>("/stock/symbol", &[("exchange", exchange)])
            .await
    }

    /// Fetches a company profile by symbol, ISIN, or CUSIP.
    pub async fn get_profile(&self, lookup: &ProfileLookup) -> Result<CompanyProfile, Error> {
        let (key, value) = lookup.query_pair();
        self.get::<CompanyProfile>("/stock/profile", &[(key, value)])
            .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
