//! State → view models.  Whatever renders the dashboard consumes these; no
//! markup is produced here.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::arbitrage::{FilterCriteria, StakePlan};
use crate::db::models::Opportunity;
use crate::refresh::{ApiStatus, DashboardState, Notification};

/// Stake levels listed in the detail view's calculation table.
pub const DETAIL_STAKES: [f64; 5] = [100.0, 500.0, 1000.0, 5000.0, 10000.0];

const NOT_AVAILABLE: &str = "N/A";

/// Colour band for a profit margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfitTier {
    High,
    Medium,
    Low,
}

impl ProfitTier {
    pub fn from_margin(margin: f64) -> Self {
        if margin > 3.0 {
            ProfitTier::High
        } else if margin > 1.0 {
            ProfitTier::Medium
        } else {
            ProfitTier::Low
        }
    }
}

/// A stake plan, or the marker shown instead when the odds are unusable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StakeView {
    Plan(StakePlan),
    InvalidOdds { total_stake: f64, message: String },
}

pub fn stake_view(opp: &Opportunity, total_stake: f64) -> StakeView {
    match opp.stake_plan(total_stake) {
        Ok(plan) => StakeView::Plan(plan),
        Err(e) => StakeView::InvalidOdds {
            total_stake,
            message: format!("Invalid odds: {}", e),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegView {
    pub bookmaker: String,
    pub bet: String,
    pub odds: Option<f64>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityCard {
    pub id: String,
    /// "{sport} - {bet_type}"
    pub title: String,
    pub team: String,
    pub profit_margin: f64,
    pub profit_label: String,
    pub tier: ProfitTier,
    pub legs: Vec<LegView>,
    pub stake: StakeView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub state: ApiStatus,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptionsView {
    pub sports: Vec<OptionView>,
    pub bookmakers: Vec<OptionView>,
    pub bet_types: Vec<OptionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub api_url: String,
    pub status: StatusView,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_updated_label: Option<String>,
    /// "(N found)"
    pub count_label: String,
    pub empty: bool,
    pub cards: Vec<OpportunityCard>,
    pub options: FilterOptionsView,
    pub criteria: FilterCriteria,
    /// Encoded filter query for the address bar (no leading `?`)
    pub query: String,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub id: String,
    pub title: String,
    /// "{margin:.2}% Profit"
    pub profit_label: String,
    pub tier: ProfitTier,
    pub event: Vec<DetailRow>,
    pub legs: Vec<LegView>,
    pub stake_table: Vec<StakeView>,
}

pub fn status_view(status: ApiStatus) -> StatusView {
    let label = match status {
        ApiStatus::Checking => "Checking...",
        ApiStatus::Connected => "Connected",
        ApiStatus::Disconnected => "Disconnected",
    };
    StatusView { state: status, label }
}

/// A link worth rendering: present, non-empty and not the "N/A" placeholder.
fn usable_link(link: &Option<String>) -> Option<String> {
    link.as_deref()
        .filter(|l| !l.is_empty() && *l != NOT_AVAILABLE)
        .map(str::to_string)
}

fn or_not_available(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

fn legs(opp: &Opportunity) -> Vec<LegView> {
    vec![
        LegView {
            bookmaker: opp.bookmaker1.clone(),
            bet: opp.bet1.clone(),
            odds: opp.odds1,
            link: usable_link(&opp.bookmaker1_link),
        },
        LegView {
            bookmaker: opp.bookmaker2.clone(),
            bet: opp.bet2.clone(),
            odds: opp.odds2,
            link: usable_link(&opp.bookmaker2_link),
        },
    ]
}

fn title(opp: &Opportunity) -> String {
    format!("{} - {}", opp.sport, opp.bet_type)
}

pub fn opportunity_card(opp: &Opportunity, card_stake: f64) -> OpportunityCard {
    OpportunityCard {
        id: opp.id.clone(),
        title: title(opp),
        team: opp.team1.clone(),
        profit_margin: opp.profit_margin,
        profit_label: format!("{:.2}%", opp.profit_margin),
        tier: ProfitTier::from_margin(opp.profit_margin),
        legs: legs(opp),
        stake: stake_view(opp, card_stake),
    }
}

fn option_views(values: &[String], selected: &Option<String>) -> Vec<OptionView> {
    values
        .iter()
        .map(|v| OptionView {
            value: v.clone(),
            selected: selected.as_deref() == Some(v.as_str()),
        })
        .collect()
}

pub fn dashboard_view(state: &DashboardState, now: DateTime<Utc>, card_stake: f64) -> DashboardView {
    let display = state.display_set();
    let cards: Vec<OpportunityCard> = display
        .iter()
        .map(|opp| opportunity_card(opp, card_stake))
        .collect();

    DashboardView {
        api_url: state.api_url.clone(),
        status: status_view(state.api_status),
        loading: state.is_loading(),
        last_updated: state.last_updated,
        last_updated_label: state
            .last_updated
            .map(|t| format!("Last updated: {}", t.format("%Y-%m-%d %H:%M:%S UTC"))),
        count_label: format!("({} found)", cards.len()),
        empty: cards.is_empty(),
        cards,
        options: FilterOptionsView {
            sports: option_views(&state.options.sports, &state.criteria.sport),
            bookmakers: option_views(&state.options.bookmakers, &state.criteria.bookmaker),
            bet_types: option_views(&state.options.bet_types, &state.criteria.bet_type),
        },
        criteria: state.criteria.clone(),
        query: state.history.current().to_string(),
        notifications: state
            .active_notifications(now)
            .into_iter()
            .cloned()
            .collect(),
    }
}

pub fn detail_view(opp: &Opportunity) -> DetailView {
    let mut event = vec![
        DetailRow { label: "Event", value: opp.team1.clone() },
        DetailRow { label: "Sport", value: opp.sport.clone() },
        DetailRow { label: "League", value: or_not_available(&opp.league) },
        DetailRow { label: "Market", value: or_not_available(&opp.market) },
        DetailRow { label: "Bet Type", value: opp.bet_type.clone() },
    ];
    if let Some(line) = opp
        .total_line
        .as_deref()
        .filter(|l| !l.is_empty() && *l != NOT_AVAILABLE)
    {
        event.push(DetailRow { label: "Total Line", value: line.to_string() });
    }
    event.push(DetailRow {
        label: "Last Updated",
        value: or_not_available(&opp.timestamp),
    });

    DetailView {
        id: opp.id.clone(),
        title: title(opp),
        profit_label: format!("{:.2}% Profit", opp.profit_margin),
        tier: ProfitTier::from_margin(opp.profit_margin),
        event,
        legs: legs(opp),
        stake_table: DETAIL_STAKES.iter().map(|&s| stake_view(opp, s)).collect(),
    }
}
