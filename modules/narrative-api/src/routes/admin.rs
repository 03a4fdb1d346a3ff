use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use narrative_scheduler::TaskParams;
use serde::Deserialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct TriggerParams {
    #[serde(rename = "type")]
    briefing_type: String,
    #[serde(default)]
    force: bool,
    #[serde(default)]
    is_smoke: bool,
}

/// `POST /admin/trigger-briefing` — returns `{task_id}` immediately
/// (§4.C11 manual trigger). `force`/`is_smoke` flow through to
/// `BriefingGenerator::generate` via `TaskParams`.
pub async fn trigger_briefing(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TriggerParams>,
) -> impl IntoResponse {
    let task_name = match params.briefing_type.as_str() {
        "morning" => "generate_morning_briefing",
        "afternoon" => "generate_afternoon_briefing",
        "evening" => "generate_evening_briefing",
        other => {
            warn!(briefing_type = %other, "unknown briefing type requested");
            return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "unknown briefing type" }))).into_response();
        }
    };

    let task_id = state.scheduler.trigger(task_name, TaskParams { force: params.force, is_smoke: params.is_smoke });
    (StatusCode::ACCEPTED, Json(serde_json::json!({ "task_id": task_id }))).into_response()
}

#[derive(Deserialize)]
pub struct DaysParam {
    days: Option<i64>,
}

pub async fn cost_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let since = chrono::Utc::now() - chrono::Duration::days(30);
    match state.store.cost_records.total_since(since).await {
        Ok(total) => Json(serde_json::json!({ "total_cost_last_30d": total })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to compute cost summary");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn cost_daily(State(state): State<Arc<AppState>>, Query(params): Query<DaysParam>) -> impl IntoResponse {
    let days = params.days.unwrap_or(30).clamp(1, 365);
    match state.store.cost_records.daily_breakdown(days).await {
        Ok(rows) => {
            let days_json: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|(day, cost)| serde_json::json!({ "date": day, "cost": cost }))
                .collect();
            Json(serde_json::json!({ "days": days_json })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "failed to compute daily cost breakdown");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn cost_by_model(State(state): State<Arc<AppState>>, Query(params): Query<DaysParam>) -> impl IntoResponse {
    let days = params.days.unwrap_or(30).clamp(1, 365);
    match state.store.cost_records.by_model(days).await {
        Ok(rows) => {
            let models_json: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|(model, cost, calls)| serde_json::json!({ "model": model, "cost": cost, "calls": calls }))
                .collect();
            Json(serde_json::json!({ "models": models_json })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "failed to compute per-model cost breakdown");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.signals_cache.stats().await {
        Ok((total, expired)) => Json(serde_json::json!({ "total_entries": total, "expired_entries": expired })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load cache stats");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn cache_clear_expired(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.signals_cache.clear_expired().await {
        Ok(removed) => Json(serde_json::json!({ "removed": removed })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to clear expired cache entries");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
