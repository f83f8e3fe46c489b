use clap::Parser;

use crate::api::validate_base_url;

/// Fallback API base when nothing is configured or stored.
pub const DEFAULT_API_URL: &str = "https://example.com/api";

/// Sports arbitrage dashboard service
#[derive(Parser, Debug, Clone)]
#[command(name = "arb-dashboard", version, about)]
pub struct Config {
    /// Arbitrage API base URL. When given it is also saved as the stored setting.
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// SQLite database holding the persisted settings
    #[arg(long, env = "DATABASE_PATH", default_value = "arb-dashboard.db")]
    pub database_path: String,

    /// Seconds between automatic refreshes
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value = "60")]
    pub refresh_interval_secs: u64,

    /// Per-request timeout for API calls, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Total stake used for the stake summary on each card
    #[arg(long, env = "CARD_STAKE", default_value = "1000")]
    pub card_stake: f64,

    /// Filter query to start with, e.g. "min_profit=2&sport=Soccer"
    #[arg(long, env = "INITIAL_QUERY")]
    pub initial_query: Option<String>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.api_url {
            if validate_base_url(url).is_none() {
                anyhow::bail!("api_url must be an absolute http(s) URL, got '{}'", url);
            }
        }
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }
        if !self.card_stake.is_finite() || self.card_stake <= 0.0 {
            anyhow::bail!("card_stake must be positive");
        }
        Ok(())
    }
}
