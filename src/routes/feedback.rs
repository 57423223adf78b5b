use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::CurrentUser, models::FeedbackEntry, services::user_library,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub text: String,
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<(StatusCode, Json<FeedbackEntry>)> {
    let entry = user_library::submit_feedback(state.store.as_ref(), &user, &request.text).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
