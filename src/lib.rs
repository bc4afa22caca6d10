//! Track feature resolution across Spotify, Last.fm and local audio analysis.

pub mod analysis;
pub mod config;
pub mod errors;
pub mod lastfm;
pub mod models;
pub mod providers;
pub mod recommendations;
pub mod resolver;
pub mod service;
pub mod spotify;

pub use config::{Endpoints, PipelineConfig, SpotifyCredentials};
pub use errors::{ResolveError, ServiceError};
pub use models::{AudioPayload, FeatureQuery, NormalizedFeatureRecord, RawProviderResult};
pub use service::{AnalysisReport, TrackAnalysisService};
