use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::arbitrage::{decode_query, filter_opportunities, FilterCriteria, FilterHistory, FilterOptions};
use crate::db::models::Opportunity;

/// How long a notification stays visible.
pub const NOTIFICATION_TTL_SECS: i64 = 5;

/// Connectivity indicator driven by the health-check probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Checking,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Danger,
}

/// A transient, auto-dismissing message for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Wall-clock source, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything the dashboard knows: the last fetched batch, the active filter
/// and the indicators around them.
#[derive(Debug)]
pub struct DashboardState {
    /// Base URL of the arbitrage API
    pub api_url: String,
    /// Last successfully fetched batch, in API order
    pub opportunities: Vec<Opportunity>,
    pub options: FilterOptions,
    pub criteria: FilterCriteria,
    pub history: FilterHistory,
    pub api_status: ApiStatus,
    pub last_updated: Option<DateTime<Utc>>,
    notifications: Vec<Notification>,
    next_notification_id: u64,
    /// Refreshes currently waiting on the opportunities fetch
    in_flight: u32,
    /// Last ticket handed to a refresh
    issued: u64,
    /// Newest ticket whose fetch / probe result has been applied
    applied_fetch: u64,
    applied_probe: u64,
}

impl DashboardState {
    pub fn new(api_url: impl Into<String>) -> Self {
        DashboardState {
            api_url: api_url.into(),
            opportunities: Vec::new(),
            options: FilterOptions::default(),
            criteria: FilterCriteria::default(),
            history: FilterHistory::default(),
            api_status: ApiStatus::Checking,
            last_updated: None,
            notifications: Vec::new(),
            next_notification_id: 1,
            in_flight: 0,
            issued: 0,
            applied_fetch: 0,
            applied_probe: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Current batch filtered by the active criteria.
    pub fn display_set(&self) -> Vec<&Opportunity> {
        filter_opportunities(&self.opportunities, &self.criteria)
    }

    pub fn find(&self, id: &str) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.id == id)
    }

    // ── Filters ───────────────────────────────────────────────────────────────

    /// Replace the criteria wholesale and push a history entry.
    /// Returns the encoded query for the address bar.
    pub fn apply_filters(&mut self, criteria: FilterCriteria) -> String {
        let query = self.history.push(&criteria);
        self.criteria = criteria;
        query
    }

    /// Reset the criteria (and history) from a page URL query.
    pub fn sync_from_query(&mut self, query: &str) {
        self.criteria = decode_query(query);
        self.history = FilterHistory::new(&self.criteria);
    }

    /// Step back to the previous filter entry.  `false` at the oldest entry.
    pub fn history_back(&mut self) -> bool {
        match self.history.back() {
            Some(criteria) => {
                self.criteria = criteria;
                true
            }
            None => false,
        }
    }

    // ── Notifications ─────────────────────────────────────────────────────────

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>, now: DateTime<Utc>) {
        self.prune_notifications(now);
        let id = self.next_notification_id;
        self.next_notification_id += 1;
        self.notifications.push(Notification {
            id,
            level,
            message: message.into(),
            raised_at: now,
        });
    }

    /// Notifications younger than the TTL, oldest first.
    pub fn active_notifications(&self, now: DateTime<Utc>) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| !is_expired(n, now))
            .collect()
    }

    fn prune_notifications(&mut self, now: DateTime<Utc>) {
        self.notifications.retain(|n| !is_expired(n, now));
    }

    // ── Refresh bookkeeping ───────────────────────────────────────────────────

    /// Mark a refresh as started and hand out its ticket.
    pub fn begin_refresh(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight += 1;
        self.api_status = ApiStatus::Checking;
        self.issued
    }

    /// The opportunities fetch of one refresh has settled, either way.
    pub fn finish_refresh(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Record a probe result unless a newer probe already landed.
    pub fn apply_probe(&mut self, ticket: u64, status: ApiStatus) -> bool {
        if ticket < self.applied_probe {
            return false;
        }
        self.applied_probe = ticket;
        self.api_status = status;
        true
    }

    /// Whether a newer fetch than `ticket` has already been applied.
    pub fn fetch_is_stale(&self, ticket: u64) -> bool {
        ticket < self.applied_fetch
    }

    /// Swap in a fetched batch unless a newer batch already landed.
    pub fn apply_fetch(&mut self, ticket: u64, opportunities: Vec<Opportunity>, now: DateTime<Utc>) -> bool {
        if self.fetch_is_stale(ticket) {
            return false;
        }
        self.applied_fetch = ticket;
        self.options = FilterOptions::from_opportunities(&opportunities);
        self.opportunities = opportunities;
        self.last_updated = Some(now);
        true
    }
}

fn is_expired(n: &Notification, now: DateTime<Utc>) -> bool {
    now - n.raised_at >= Duration::seconds(NOTIFICATION_TTL_SECS)
}
