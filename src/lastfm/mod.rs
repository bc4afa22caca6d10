//! Last.fm integration: tag-based feature estimates and similarity lookups.

pub mod client;
pub mod heuristics;
pub mod models;
pub mod provider;

pub use client::LastFmClient;
pub use heuristics::{estimate_from_tags, TagEstimate};
pub use provider::LastFmProvider;
