use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct LimitParam {
    limit: Option<i64>,
}

pub async fn active(State(state): State<Arc<AppState>>, Query(params): Query<LimitParam>) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(20).clamp(1, 200);
    match state.store.narratives.list_active(limit).await {
        Ok(narratives) => Json(serde_json::json!({ "narratives": narratives })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load active narratives");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn archived(State(state): State<Arc<AppState>>, Query(params): Query<LimitParam>) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(20).clamp(1, 200);
    match state.store.narratives.list_archived(limit).await {
        Ok(narratives) => Json(serde_json::json!({ "narratives": narratives })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load archived narratives");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn resurrections(State(state): State<Arc<AppState>>, Query(params): Query<LimitParam>) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(20).clamp(1, 200);
    match state.store.narratives.list_reactivated(limit).await {
        Ok(narratives) => Json(serde_json::json!({ "narratives": narratives })).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load reactivated narratives");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn detail(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    match state.store.narratives.get_by_id(&id).await {
        Ok(Some(narrative)) => {
            let articles = state
                .store
                .articles
                .list_by_narrative(&id, 0, 10)
                .await
                .unwrap_or_default();
            Json(serde_json::json!({
                "narrative": narrative,
                "recent_articles": articles,
            }))
            .into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!(error = %e, narrative_id = %id, "failed to load narrative detail");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct ArticlesPageParams {
    offset: Option<i64>,
    limit: Option<i64>,
}

/// Registered before `detail` in the router — the route ordering
/// invariant in §6 (`/{id}/articles` must precede `/{id}`).
pub async fn articles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ArticlesPageParams>,
) -> impl IntoResponse {
    let offset = params.offset.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(20).clamp(1, 50);

    match state.store.articles.list_by_narrative(&id, offset, limit).await {
        Ok(articles) => Json(serde_json::json!({ "articles": articles })).into_response(),
        Err(e) => {
            warn!(error = %e, narrative_id = %id, "failed to load narrative articles");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
