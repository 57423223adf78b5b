use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::Rating,
    services::user_library::{self, RatedMovie},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: f64,
}

/// The caller's ratings, newest first
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Vec<RatedMovie>>> {
    let ratings = user_library::list_ratings(state.store.as_ref(), &state.index, &user).await?;
    Ok(Json(ratings))
}

/// Creates or replaces the caller's rating for a movie
pub async fn rate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(movie_id): Path<i64>,
    Json(request): Json<RateRequest>,
) -> AppResult<Json<Rating>> {
    let rating = user_library::rate_movie(
        state.store.as_ref(),
        &state.index,
        &user,
        movie_id,
        request.rating,
    )
    .await?;
    Ok(Json(rating))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(movie_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.store.delete_rating(user.id, movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
