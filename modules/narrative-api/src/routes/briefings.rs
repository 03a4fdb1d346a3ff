use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use chrono::NaiveDate;
use narrative_common::types::{Briefing, BriefingContent, BriefingMetadata, BriefingType};
use serde::Deserialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct DateParam {
    date: Option<NaiveDate>,
}

pub async fn latest(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.briefings.latest().await {
        Ok(Some(briefing)) => Json(briefing).into_response(),
        Ok(None) => Json(placeholder()).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to load latest briefing");
            Json(placeholder()).into_response()
        }
    }
}

pub async fn by_type(
    State(state): State<Arc<AppState>>,
    Path(briefing_type): Path<String>,
    Query(params): Query<DateParam>,
) -> impl IntoResponse {
    let result = match params.date {
        Some(date) => state.store.briefings.by_type_and_date(&briefing_type, date).await,
        None => state.store.briefings.latest_by_type(&briefing_type).await,
    };

    match result {
        Ok(Some(briefing)) => Json(briefing).into_response(),
        Ok(None) => Json(placeholder()).into_response(),
        Err(e) => {
            warn!(error = %e, briefing_type = %briefing_type, "failed to load briefing");
            Json(placeholder()).into_response()
        }
    }
}

/// §7 "A missing latest briefing returns a clearly-typed placeholder
/// (`_id=placeholder`, real content blank), not an error."
fn placeholder() -> Briefing {
    Briefing {
        id: "placeholder".to_string(),
        briefing_type: BriefingType::Morning,
        generated_at: chrono::DateTime::from_timestamp(0, 0).expect("epoch is a valid timestamp"),
        version: 1,
        published: false,
        is_smoke: false,
        task_id: None,
        content: BriefingContent {
            narrative: String::new(),
            key_insights: Vec::new(),
            entities_mentioned: Vec::new(),
            detected_patterns: Vec::new(),
            recommendations: Vec::new(),
        },
        metadata: BriefingMetadata {
            model: String::new(),
            confidence: 0.0,
            signal_count: 0,
            narrative_count: 0,
            pattern_count: 0,
            refinement_iterations: 0,
        },
    }
}
