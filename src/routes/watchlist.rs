use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::WatchlistItem,
    services::user_library,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AddToWatchlistRequest {
    pub movie_id: i64,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Vec<WatchlistItem>>> {
    Ok(Json(state.store.list_watchlist(user.id).await?))
}

/// 201 when the movie is newly added, 200 when it was already listed
pub async fn add(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(request): Json<AddToWatchlistRequest>,
) -> AppResult<(StatusCode, Json<WatchlistItem>)> {
    let (item, added) =
        user_library::add_to_watchlist(state.store.as_ref(), &state.index, &user, request.movie_id)
            .await?;

    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(item)))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.store.remove_from_watchlist(user.id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
