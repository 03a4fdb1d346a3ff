use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct RecentParams {
    limit: Option<i64>,
}

pub async fn recent(State(state): State<Arc<AppState>>, Query(params): Query<RecentParams>) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(20).clamp(1, 200);
    match state.store.articles.list_recent(limit).await {
        Ok(articles) => Json(serde_json::json!({ "articles": articles })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load recent articles");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
