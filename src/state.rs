use std::sync::Arc;

use crate::{
    db::UserDataStore,
    services::{RecommendationEngine, SimilarityIndex},
};

/// Shared application state
///
/// Everything here is either immutable (the catalog) or handles its own
/// synchronization (the store), so handlers share it without a lock.
pub struct AppState {
    pub index: Arc<SimilarityIndex>,
    pub engine: RecommendationEngine,
    pub store: Arc<dyn UserDataStore>,
    /// `k` used when a recommendation request does not give one
    pub default_recommendations: usize,
}

impl AppState {
    pub fn new(
        index: Arc<SimilarityIndex>,
        engine: RecommendationEngine,
        store: Arc<dyn UserDataStore>,
        default_recommendations: usize,
    ) -> Self {
        Self {
            index,
            engine,
            store,
            default_recommendations,
        }
    }
}
