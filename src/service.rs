//! Wires providers, resolver and recommendations from a `PipelineConfig`.

use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;

use crate::analysis::LocalAnalysisProvider;
use crate::config::{PipelineConfig, USER_AGENT};
use crate::errors::{ResolveError, ServiceError};
use crate::lastfm::{LastFmClient, LastFmProvider};
use crate::models::{AudioPayload, FeatureQuery, NormalizedFeatureRecord};
use crate::recommendations::{RecommendationEngine, SimilarTrack};
use crate::resolver::FeatureResolver;
use crate::spotify::{SpotifyClient, SpotifyProvider, TokenCache};

/// Everything one query produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub record: NormalizedFeatureRecord,
    pub recommendations: Vec<SimilarTrack>,
}

pub struct TrackAnalysisService {
    resolver: FeatureResolver,
    recommendations: RecommendationEngine,
    tokens: Option<Arc<TokenCache>>,
}

impl TrackAnalysisService {
    /// Spotify joins the chain only with complete credentials; Last.fm only
    /// with an API key. Local analysis is always registered.
    pub fn new(config: PipelineConfig) -> Result<Self, ServiceError> {
        log::debug!("Building analysis service from {:?}", config);

        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let mut resolver = FeatureResolver::new();
        let mut tokens = None;

        match config.spotify.as_ref().filter(|c| c.is_complete()) {
            Some(credentials) => {
                let cache = Arc::new(TokenCache::new(
                    http.clone(),
                    config.endpoints.spotify_token_url.clone(),
                    config.effective_safety_margin(),
                ));
                let client = SpotifyClient::new(
                    http.clone(),
                    config.endpoints.spotify_api_base.clone(),
                    credentials.clone(),
                    cache.clone(),
                );
                resolver.register(Arc::new(SpotifyProvider::new(client)));
                tokens = Some(cache);
            }
            None => log::info!("Spotify credentials not configured, using Last.fm only"),
        }

        let lastfm = config
            .lastfm_api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| {
                Arc::new(LastFmProvider::new(LastFmClient::new(
                    http.clone(),
                    config.endpoints.lastfm_api_base.clone(),
                    key.clone(),
                )))
            });

        match &lastfm {
            Some(provider) => resolver.register(provider.clone()),
            None => log::warn!("Last.fm API key not configured, no fallback or recommendations"),
        }

        let resolver = resolver.with_local(Arc::new(LocalAnalysisProvider::basic()));
        let recommendations = RecommendationEngine::new(lastfm, config.recommendation_limit);

        Ok(Self {
            resolver,
            recommendations,
            tokens,
        })
    }

    pub fn from_parts(resolver: FeatureResolver, recommendations: RecommendationEngine) -> Self {
        Self {
            resolver,
            recommendations,
            tokens: None,
        }
    }

    /// Validates raw input, then analyzes. Blank input never reaches a provider.
    pub async fn analyze_input(
        &self,
        artist: &str,
        track: &str,
        audio: Option<AudioPayload>,
    ) -> Result<AnalysisReport, ResolveError> {
        let mut query = FeatureQuery::new(artist, track)?;
        if let Some(audio) = audio {
            query = query.with_audio(audio);
        }
        self.analyze(&query).await
    }

    /// Resolution and recommendations run concurrently; a recommendation
    /// failure only empties the list.
    pub async fn analyze(&self, query: &FeatureQuery) -> Result<AnalysisReport, ResolveError> {
        let (record, recommendations) = tokio::join!(
            self.resolver.resolve_and_merge(query),
            self.recommendations
                .find_similar(query.artist(), query.track()),
        );

        Ok(AnalysisReport {
            record: record?,
            recommendations,
        })
    }

    pub fn resolver(&self) -> &FeatureResolver {
        &self.resolver
    }

    pub fn recommendations(&self) -> &RecommendationEngine {
        &self.recommendations
    }

    /// Shared Spotify token cache, when Spotify is configured.
    pub fn token_cache(&self) -> Option<&Arc<TokenCache>> {
        self.tokens.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpotifyCredentials;
    use crate::providers::ProviderId;

    #[test]
    fn test_chain_follows_configuration() {
        let service = TrackAnalysisService::new(PipelineConfig::default()).unwrap();
        assert!(service.resolver().chain().is_empty());
        assert!(!service.recommendations().is_enabled());
        assert!(service.token_cache().is_none());

        let service = TrackAnalysisService::new(PipelineConfig {
            spotify: Some(SpotifyCredentials::new("id", "secret")),
            lastfm_api_key: Some("key".to_string()),
            ..PipelineConfig::default()
        })
        .unwrap();
        assert_eq!(
            service.resolver().chain(),
            vec![ProviderId::Spotify, ProviderId::LastFm]
        );
        assert!(service.recommendations().is_enabled());
        assert!(service.token_cache().is_some());
    }

    #[test]
    fn test_incomplete_spotify_credentials_skip_spotify() {
        let service = TrackAnalysisService::new(PipelineConfig {
            spotify: Some(SpotifyCredentials::new("id", "")),
            lastfm_api_key: Some("key".to_string()),
            ..PipelineConfig::default()
        })
        .unwrap();
        assert_eq!(service.resolver().chain(), vec![ProviderId::LastFm]);
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let service = TrackAnalysisService::new(PipelineConfig::default()).unwrap();
        let result = service.analyze_input("", "Song", None).await;
        assert!(matches!(result, Err(ResolveError::MissingInput(_))));
    }
}
