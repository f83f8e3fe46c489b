pub mod client;

pub use client::HttpApi;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::db::models::Opportunity;

/// Failure talking to the arbitrage API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Trim and check a user-supplied API base.  Only absolute http(s) URLs with
/// a host are accepted; the trimmed input is returned as typed.
pub fn validate_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    Some(trimmed.to_string())
}

/// The remote API the dashboard reads from.  Every call takes the base URL so
/// a settings change applies to the next request without rebuilding anything.
#[async_trait]
pub trait OpportunityApi: Send + Sync {
    /// `GET {base}/health-check`; `Ok` on a 2xx JSON response.
    async fn health_check(&self, base_url: &str) -> Result<(), ApiError>;

    /// `GET {base}/opportunities`
    async fn fetch_opportunities(&self, base_url: &str) -> Result<Vec<Opportunity>, ApiError>;
}
