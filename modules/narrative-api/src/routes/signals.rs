use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use narrative_signals::SignalQuery;
use serde::Deserialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct TrendingParams {
    limit: Option<usize>,
    min_score: Option<f32>,
    entity_type: Option<String>,
    timeframe: Option<i64>,
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingParams>,
) -> impl IntoResponse {
    let query = SignalQuery {
        limit: params.limit.unwrap_or(20).min(100),
        min_score: params.min_score.unwrap_or(0.0),
        entity_type: params.entity_type,
        timeframe_hours: params.timeframe.unwrap_or(24),
    };

    match state.signals.trending(&query).await {
        Ok(signals) => Json(serde_json::json!({ "signals": signals })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load trending signals");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
