use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    state::AppState,
};

pub mod admin;
pub mod feedback;
pub mod movies;
pub mod ratings;
pub mod recommendations;
pub mod watchlist;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", get(recommendations::recommend))
        // Catalog
        .route("/movies", get(movies::browse))
        .route("/movies/genres", get(movies::genres))
        .route("/movies/search", get(movies::search))
        .route("/movies/:movie_id/details", get(movies::details))
        // Per-user data
        .route("/ratings", get(ratings::list))
        .route("/ratings/:movie_id", put(ratings::rate))
        .route("/ratings/:movie_id", delete(ratings::remove))
        .route("/watchlist", get(watchlist::list))
        .route("/watchlist", post(watchlist::add))
        .route("/watchlist/:item_id", delete(watchlist::remove))
        .route("/feedback", post(feedback::submit))
        // Admin
        .route("/admin/metrics", get(admin::metrics))
        .route("/admin/feedback", get(admin::feedback))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
