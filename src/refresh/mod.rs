pub mod state;

pub use state::{ApiStatus, Clock, DashboardState, Notification, NotificationLevel, SystemClock};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{validate_base_url, OpportunityApi};
use crate::db::Database;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch opportunities from API";
pub const API_URL_SAVED_MESSAGE: &str = "API URL updated successfully";
pub const API_URL_INVALID_MESSAGE: &str = "Please enter a valid API URL";

/// Owns the fetch lifecycle: health probe, opportunities fetch and the shared
/// dashboard state they update.
pub struct RefreshController {
    api: Arc<dyn OpportunityApi>,
    db: Database,
    state: Arc<RwLock<DashboardState>>,
    clock: Arc<dyn Clock>,
}

impl RefreshController {
    pub fn new(
        api: Arc<dyn OpportunityApi>,
        db: Database,
        state: DashboardState,
        clock: Arc<dyn Clock>,
    ) -> Self {
        RefreshController {
            api,
            db,
            state: Arc::new(RwLock::new(state)),
            clock,
        }
    }

    pub fn state(&self) -> &Arc<RwLock<DashboardState>> {
        &self.state
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Run one refresh cycle: probe and fetch concurrently, then fold both
    /// results into the state.  Never fails; errors end up as indicators and
    /// notifications.
    pub async fn refresh(&self) {
        let (ticket, base_url) = {
            let mut state = self.state.write().await;
            (state.begin_refresh(), state.api_url.clone())
        };
        debug!(ticket, "Refreshing opportunities from {}", base_url);

        futures_util::future::join(self.probe(ticket, &base_url), self.load(ticket, &base_url)).await;
    }

    async fn probe(&self, ticket: u64, base_url: &str) {
        let status = match self.api.health_check(base_url).await {
            Ok(()) => ApiStatus::Connected,
            Err(e) => {
                warn!("API connection error: {}", e);
                ApiStatus::Disconnected
            }
        };
        let mut state = self.state.write().await;
        if !state.apply_probe(ticket, status) {
            debug!(ticket, "Discarding stale health-check result");
        }
    }

    async fn load(&self, ticket: u64, base_url: &str) {
        let result = self.api.fetch_opportunities(base_url).await;
        let now = self.clock.now();

        let mut state = self.state.write().await;
        match result {
            Ok(opportunities) => {
                let fetched = opportunities.len();
                if state.apply_fetch(ticket, opportunities, now) {
                    info!(
                        "Loaded {} opportunities ({} match current filters)",
                        fetched,
                        state.display_set().len()
                    );
                } else {
                    debug!(ticket, "Discarding stale opportunities response");
                }
            }
            Err(e) if state.fetch_is_stale(ticket) => {
                debug!(ticket, "Ignoring stale fetch failure: {}", e);
            }
            Err(e) => {
                error!("Error fetching opportunities: {}", e);
                state.notify(NotificationLevel::Danger, FETCH_FAILED_MESSAGE, now);
            }
        }
        state.finish_refresh();
    }

    /// Start a refresh in the background.  Overlapping refreshes are allowed.
    pub fn trigger(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.refresh().await })
    }

    /// Validate, persist and apply a new API base URL, then refresh against
    /// it.  Returns `Ok(false)` when the input was rejected.
    pub async fn update_api_url(self: &Arc<Self>, raw: &str) -> Result<bool> {
        let now = self.clock.now();
        let Some(url) = validate_base_url(raw) else {
            warn!("Rejected API URL '{}'", raw);
            self.state
                .write()
                .await
                .notify(NotificationLevel::Danger, API_URL_INVALID_MESSAGE, now);
            return Ok(false);
        };

        self.db.set_api_url(&url)?;
        {
            let mut state = self.state.write().await;
            state.api_url = url.clone();
            state.notify(NotificationLevel::Success, API_URL_SAVED_MESSAGE, now);
        }
        info!("API URL set to {}", url);

        self.trigger();
        Ok(true)
    }

    /// Spawn the polling task: one refresh right away, then one per `period`.
    /// Polling runs until the returned handle is stopped or dropped.
    pub fn start(self: &Arc<Self>, period: Duration) -> RefreshHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let this = Arc::clone(self);

        let task = tokio::spawn(async move {
            info!("Refresh scheduler started (interval={:?})", period);
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        // Detached so a hung request never delays the next tick
                        this.trigger();
                    }
                }
            }
            info!("Refresh scheduler stopped");
        });

        RefreshHandle {
            stop_tx: Some(stop_tx),
            task,
        }
    }
}

/// Handle on the polling task started by [`RefreshController::start`].
pub struct RefreshHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop scheduling new refreshes and wait for the task to exit.
    /// Refreshes already in flight still complete.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!("Refresh scheduler task failed: {}", e);
        }
    }
}
