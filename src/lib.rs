//! Movie recommendation service.
//!
//! "More like this" recommendations come from a precomputed similarity matrix
//! and are decorated with TMDB posters and details. Around that core sit the
//! catalog browse/search endpoints, per-user ratings, watchlists and feedback,
//! and an admin usage dashboard.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
