//! Typed errors for the recommendation lookup.
//!
//! These stay inside `RecommendationEngine`; `find_similar` turns every one
//! of them into an empty list.

use serde::Serialize;
use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum RecommendationError {
    /// Last.fm could not be reached or rejected the call
    #[error("Last.fm request failed: {0}")]
    Http(String),

    /// Last.fm answered with something we could not read
    #[error("Could not parse Last.fm response: {0}")]
    Parse(String),

    /// No Last.fm API key was configured
    #[error("Recommendations are not configured")]
    NotConfigured,
}

impl From<ProviderError> for RecommendationError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::AuthConfig => RecommendationError::NotConfigured,
            ProviderError::Parse(msg) => RecommendationError::Parse(msg),
            other => RecommendationError::Http(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_error() {
        assert!(matches!(
            RecommendationError::from(ProviderError::AuthConfig),
            RecommendationError::NotConfigured
        ));
        assert!(matches!(
            RecommendationError::from(ProviderError::Parse("bad".into())),
            RecommendationError::Parse(_)
        ));
        assert!(matches!(
            RecommendationError::from(ProviderError::Network("down".into())),
            RecommendationError::Http(_)
        ));
    }
}
