pub mod view;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::arbitrage::query::{self, parse_number};
use crate::arbitrage::FilterCriteria;
use crate::refresh::RefreshController;
use view::{dashboard_view, detail_view, stake_view, DashboardView};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<RefreshController>,
    /// Total stake used for the per-card stake summary
    pub card_stake: f64,
}

/// Build the Axum router for the dashboard API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/filters", post(apply_filters_handler))
        .route("/api/filters/url", post(filters_from_url_handler))
        .route("/api/filters/back", post(filters_back_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/opportunities/:id", get(detail_handler))
        .route("/api/opportunities/:id/stake", get(stake_handler))
        .route("/api/settings", get(get_settings_handler).put(put_settings_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn current_view(state: &AppState) -> DashboardView {
    let controller = &state.controller;
    let dashboard = controller.state().read().await;
    dashboard_view(&dashboard, controller.clock().now(), state.card_stake)
}

/// Raw filter form inputs, as typed by the user.
#[derive(Debug, Default, Deserialize)]
pub struct FilterForm {
    #[serde(default)]
    pub min_profit: Option<String>,
    #[serde(default)]
    pub max_profit: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub bookmaker: Option<String>,
    #[serde(default)]
    pub bet_type: Option<String>,
}

impl FilterForm {
    pub fn into_criteria(self) -> FilterCriteria {
        FilterCriteria::new(
            self.min_profit
                .as_deref()
                .and_then(|v| parse_number(query::MIN_PROFIT, v)),
            self.max_profit
                .as_deref()
                .and_then(|v| parse_number(query::MAX_PROFIT, v)),
            self.sport,
            self.bookmaker,
            self.bet_type,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct FiltersResponse {
    /// Query to push onto the address bar (no leading `?`)
    pub query: String,
    pub view: DashboardView,
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub api_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StakeParams {
    pub amount: f64,
}

/// GET /api/dashboard
async fn dashboard_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(current_view(&state).await)
}

/// POST /api/filters
async fn apply_filters_handler(
    State(state): State<Arc<AppState>>,
    Json(form): Json<FilterForm>,
) -> impl IntoResponse {
    let criteria = form.into_criteria();
    let cleared = criteria.is_empty();
    let query = state.controller.state().write().await.apply_filters(criteria);
    if cleared {
        info!("Filters cleared");
    } else {
        info!("Filters applied: ?{}", query);
    }
    Json(FiltersResponse {
        query,
        view: current_view(&state).await,
    })
}

/// POST /api/filters/url: sync criteria from the page URL on load
async fn filters_from_url_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UrlQuery>,
) -> impl IntoResponse {
    state.controller.state().write().await.sync_from_query(&body.query);
    Json(current_view(&state).await)
}

/// POST /api/filters/back
async fn filters_back_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let moved = state.controller.state().write().await.history_back();
    let view = current_view(&state).await;
    let status = if moved { StatusCode::OK } else { StatusCode::CONFLICT };
    (status, Json(view))
}

/// POST /api/refresh
async fn refresh_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.controller.trigger();
    StatusCode::ACCEPTED
}

/// GET /api/opportunities/:id
async fn detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let dashboard = state.controller.state().read().await;
    match dashboard.find(&id) {
        Some(opp) => Ok(Json(detail_view(opp))),
        None => {
            debug!("Opportunity not found: {}", id);
            Err((StatusCode::NOT_FOUND, format!("opportunity {} not found", id)))
        }
    }
}

/// GET /api/opportunities/:id/stake?amount=250
async fn stake_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<StakeParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !params.amount.is_finite() || params.amount <= 0.0 {
        return Err((StatusCode::BAD_REQUEST, "amount must be a positive number".to_string()));
    }
    let dashboard = state.controller.state().read().await;
    let opp = dashboard
        .find(&id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("opportunity {} not found", id)))?;
    Ok(Json(stake_view(opp, params.amount)))
}

/// GET /api/settings
async fn get_settings_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let api_url = state.controller.state().read().await.api_url.clone();
    Json(Settings { api_url })
}

/// PUT /api/settings
async fn put_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let saved = state
        .controller
        .update_api_url(&settings.api_url)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let status = if saved {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(current_view(&state).await)))
}
