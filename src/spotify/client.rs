use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::models::{AudioAnalysis, AudioFeatures, SearchResponse, SpotifyTrack};
use super::token::TokenCache;
use crate::config::SpotifyCredentials;
use crate::providers::ProviderError;

/// Two attempts: the original call and one retry after a token refresh.
const MAX_AUTH_ATTEMPTS: usize = 2;

#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    api_base: String,
    credentials: SpotifyCredentials,
    tokens: Arc<TokenCache>,
}

impl SpotifyClient {
    pub fn new(
        http: Client,
        api_base: impl Into<String>,
        credentials: SpotifyCredentials,
        tokens: Arc<TokenCache>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
            tokens,
        }
    }

    /// First track matching `query`, or `None` when the search came back empty.
    pub async fn search_track(&self, query: &str) -> Result<Option<SpotifyTrack>, ProviderError> {
        let response: SearchResponse = self
            .get_json("/search", &[("q", query), ("type", "track"), ("limit", "1")])
            .await?;

        Ok(response
            .tracks
            .and_then(|page| page.items.into_iter().next()))
    }

    pub async fn audio_features(&self, track_id: &str) -> Result<AudioFeatures, ProviderError> {
        self.get_json(&format!("/audio-features/{}", track_id), &[])
            .await
    }

    pub async fn audio_analysis(&self, track_id: &str) -> Result<AudioAnalysis, ProviderError> {
        self.get_json(&format!("/audio-analysis/{}", track_id), &[])
            .await
    }

    /// GET with a bearer token. A 401/403 invalidates the cached token and
    /// retries once; a second rejection is returned as `Unauthorized`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.api_base, path);

        for attempt in 1..=MAX_AUTH_ATTEMPTS {
            let token = self.tokens.get_token(&self.credentials).await?;

            let response = self
                .http
                .get(&url)
                .query(params)
                .bearer_auth(&token)
                .send()
                .await?;

            let status = response.status();

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                if attempt == MAX_AUTH_ATTEMPTS {
                    log::warn!("Spotify rejected refreshed token ({}) at {}", status, path);
                    break;
                }
                log::warn!(
                    "Spotify returned {} for {}, refreshing token and retrying",
                    status,
                    path
                );
                self.tokens.invalidate().await;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(ProviderError::Unavailable(format!("{} not found", path)));
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                log::warn!("Spotify request failed ({}) at {}: {}", status, path, text);
                return Err(ProviderError::Network(format!("HTTP {} - {}", status, text)));
            }

            return Ok(response.json::<T>().await?);
        }

        Err(ProviderError::Unauthorized)
    }
}
