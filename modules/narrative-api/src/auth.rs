use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Guards the admin surface (§6 "shared API key in `X-API-Key` header for
/// all non-public endpoints"). Read endpoints stay public; everything
/// under `/admin` requires this.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == state.api_key => next.run(request).await,
        _ => (StatusCode::UNAUTHORIZED, "missing or invalid X-API-Key").into_response(),
    }
}
