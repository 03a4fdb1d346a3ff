pub mod auth;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};

pub use state::AppState;

/// Builds the full `/api/v1` surface (§6). Route ordering matters:
/// `/narratives/{id}/articles` is registered before `/narratives/{id}` so
/// the more specific path wins, per the route ordering invariant.
pub fn build_router(state: Arc<AppState>, cors_origins: &[String], debug: bool) -> Router {
    let admin_routes = Router::new()
        .route("/trigger-briefing", post(routes::admin::trigger_briefing))
        .route("/api-costs/summary", get(routes::admin::cost_summary))
        .route("/api-costs/daily", get(routes::admin::cost_daily))
        .route("/api-costs/by-model", get(routes::admin::cost_by_model))
        .route("/cache/stats", get(routes::admin::cache_stats))
        .route("/cache/clear-expired", post(routes::admin::cache_clear_expired))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

    let api_v1 = Router::new()
        .route("/signals/trending", get(routes::signals::trending))
        .route("/narratives/active", get(routes::narratives::active))
        .route("/narratives/archived", get(routes::narratives::archived))
        .route("/narratives/resurrections", get(routes::narratives::resurrections))
        .route("/narratives/{id}/articles", get(routes::narratives::articles))
        .route("/narratives/{id}", get(routes::narratives::detail))
        .route("/briefing", get(routes::briefings::latest))
        .route("/briefing/{briefing_type}", get(routes::briefings::by_type))
        .route("/articles/recent", get(routes::articles::recent))
        .nest("/admin", admin_routes);

    Router::new()
        .route("/", get(|| async { "ok" }))
        .nest("/api/v1", api_v1)
        .with_state(state)
        .layer(cors_layer(cors_origins, debug))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

fn cors_layer(cors_origins: &[String], debug: bool) -> tower_http::cors::CorsLayer {
    if debug {
        return tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("x-api-key")]);
    }

    let origins: Vec<HeaderValue> = cors_origins.iter().filter_map(|s| s.trim().parse().ok()).collect();
    tower_http::cors::CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("x-api-key")])
}
