//! Similar-track recommendations, looked up independently of feature resolution.

pub mod engine;
pub mod errors;
pub mod types;

pub use engine::RecommendationEngine;
pub use errors::RecommendationError;
pub use types::{SimilarTrack, VARIOUS_ARTISTS};
