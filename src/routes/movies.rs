use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieCard, RecommendationResult},
    services::similarity_index::BROWSE_GENRES,
    state::AppState,
};

const DEFAULT_BROWSE_LIMIT: usize = 10;
const MAX_BROWSE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub genre: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

/// Genres offered for browsing
pub async fn genres() -> Json<Vec<&'static str>> {
    Json(BROWSE_GENRES.to_vec())
}

/// Top catalog movies in a genre, with posters
pub async fn browse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BrowseQuery>,
) -> AppResult<Json<Vec<MovieCard>>> {
    let genre = params.genre.unwrap_or_default();
    if genre.trim().is_empty() {
        return Err(AppError::InvalidInput("Genre cannot be empty".to_string()));
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_BROWSE_LIMIT)
        .min(MAX_BROWSE_LIMIT);

    let movies: Vec<Movie> = state
        .index
        .movies_in_genre(&genre, limit)
        .into_iter()
        .cloned()
        .collect();

    tracing::info!(genre = %genre, results = movies.len(), "Genre browse");

    Ok(Json(state.engine.movie_cards(movies).await))
}

/// Handler for title search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let query = params.q.unwrap_or_default();
    let movies: Vec<Movie> = state
        .index
        .search_titles(&query)?
        .into_iter()
        .cloned()
        .collect();

    tracing::info!(query = %query, results = movies.len(), "Title search completed");

    Ok(Json(movies))
}

/// Poster and details for one catalog movie
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<RecommendationResult>> {
    Ok(Json(state.engine.describe(movie_id).await?))
}
