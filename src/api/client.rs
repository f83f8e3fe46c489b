use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ApiError, OpportunityApi};
use crate::db::models::Opportunity;

/// reqwest-backed client for the arbitrage API.
#[derive(Clone)]
pub struct HttpApi {
    http: Client,
}

impl HttpApi {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpApi { http })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        debug!("GET {}", url);

        let resp = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(source) => return Err(ApiError::Transport { url, source }),
        };

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: resp.status(),
            });
        }

        let body = match resp.text().await {
            Ok(b) => b,
            Err(source) => return Err(ApiError::Transport { url, source }),
        };
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { url, source })
    }
}

/// Join the configured base with an endpoint path, tolerating a trailing `/`.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

#[async_trait]
impl OpportunityApi for HttpApi {
    async fn health_check(&self, base_url: &str) -> Result<(), ApiError> {
        // Body content is irrelevant as long as it is JSON
        self.get_json::<serde_json::Value>(endpoint(base_url, "health-check"))
            .await
            .map(|_| ())
    }

    async fn fetch_opportunities(&self, base_url: &str) -> Result<Vec<Opportunity>, ApiError> {
        let records: Vec<serde_json::Value> =
            self.get_json(endpoint(base_url, "opportunities")).await?;
        Ok(decode_records(records))
    }
}

/// Convert raw records one by one; a malformed record is dropped with a
/// warning instead of failing the batch.
fn decode_records(records: Vec<serde_json::Value>) -> Vec<Opportunity> {
    let total = records.len();
    let opportunities: Vec<Opportunity> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(opp) => Some(opp),
            Err(e) => {
                warn!("Skipping malformed opportunity #{}: {}", index, e);
                None
            }
        })
        .collect();
    if opportunities.len() < total {
        warn!(
            "Kept {} of {} opportunities from the API",
            opportunities.len(),
            total
        );
    }
    opportunities
}
