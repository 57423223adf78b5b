pub mod admin;
pub mod providers;
pub mod recommendations;
pub mod similarity_index;
pub mod user_library;

pub use providers::MetadataEnricher;
pub use recommendations::{EngineSettings, RecommendationEngine};
pub use similarity_index::SimilarityIndex;
