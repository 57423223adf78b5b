use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::AdminUser,
    models::FeedbackEntry,
    services::admin::{self, AdminDashboard},
    state::AppState,
};

/// Key metrics plus most-rated movies and most active users
pub async fn metrics(
    State(state): State<Arc<AppState>>,
    AdminUser(user): AdminUser,
) -> AppResult<Json<AdminDashboard>> {
    tracing::info!(admin_id = %user.id, "Admin dashboard requested");
    Ok(Json(admin::dashboard(state.store.as_ref(), &state.index).await?))
}

pub async fn feedback(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> AppResult<Json<Vec<FeedbackEntry>>> {
    Ok(Json(admin::all_feedback(state.store.as_ref()).await?))
}
