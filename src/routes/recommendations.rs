use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::RecommendationResult,
    services::recommendations::MAX_RECOMMENDATIONS,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: Option<String>,
    pub k: Option<usize>,
}

/// Handler for recommendations endpoint
///
/// Unknown titles produce an empty list, not an error.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<RecommendationResult>>> {
    let title = params
        .title
        .ok_or_else(|| AppError::InvalidInput("Missing query parameter: title".to_string()))?;
    let k = params
        .k
        .unwrap_or(state.default_recommendations)
        .min(MAX_RECOMMENDATIONS);

    tracing::info!(
        request_id = %request_id,
        title = %title,
        k,
        "Processing recommendation request"
    );

    let results = state.engine.recommend(&title, k).await;

    tracing::info!(
        request_id = %request_id,
        returned = results.len(),
        "Recommendation request completed"
    );

    Ok(Json(results))
}
