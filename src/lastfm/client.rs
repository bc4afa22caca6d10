use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::{
    ApiError, LastFmTrack, SimilarArtistsResponse, SimilarTracksResponse, TrackInfoResponse,
};
use crate::providers::ProviderError;
use crate::recommendations::SimilarTrack;

const UNKNOWN_TRACK: &str = "Unknown Track";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Keyed Last.fm REST client. The API key is sent as a query parameter and
/// never logged.
#[derive(Clone)]
pub struct LastFmClient {
    http: Client,
    api_base: String,
    api_key: String,
}

impl LastFmClient {
    pub fn new(http: Client, api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::AuthConfig);
        }

        let response = self
            .http
            .get(&self.api_base)
            .query(&[
                ("method", method),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        // Last.fm reports most failures as a JSON error envelope, sometimes with 200.
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                ProviderError::Parse(format!("{}: {}", method, e))
            } else {
                ProviderError::Network(format!("{}: HTTP {}", method, status))
            }
        })?;

        if let Ok(api_error) = serde_json::from_value::<ApiError>(body.clone()) {
            log::warn!(
                "Last.fm {} error {}: {}",
                method,
                api_error.error,
                api_error.message
            );
            return Err(match api_error.error {
                // invalid key / suspended key / auth
                4 | 9 | 10 | 26 => ProviderError::AuthConfig,
                _ => ProviderError::Unavailable(format!("{}: {}", method, api_error.message)),
            });
        }

        if !status.is_success() {
            log::warn!("Last.fm {} failed ({})", method, status);
            return Err(ProviderError::Network(format!("{}: HTTP {}", method, status)));
        }

        Ok(serde_json::from_value(body)?)
    }

    pub async fn track_info(&self, artist: &str, track: &str) -> Result<LastFmTrack, ProviderError> {
        let response: TrackInfoResponse = self
            .call(
                "track.getInfo",
                &[("artist", artist), ("track", track), ("autocorrect", "1")],
            )
            .await?;
        Ok(response.track)
    }

    /// Similar tracks in Last.fm's ranking order.
    pub async fn similar_tracks(
        &self,
        artist: &str,
        track: &str,
        limit: usize,
    ) -> Result<Vec<SimilarTrack>, ProviderError> {
        let limit_param = limit.to_string();
        let response: SimilarTracksResponse = self
            .call(
                "track.getsimilar",
                &[("artist", artist), ("track", track), ("limit", &limit_param)],
            )
            .await?;

        Ok(response
            .similartracks
            .map(|s| s.track.into_vec())
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                SimilarTrack::new(
                    entry.name.unwrap_or_else(|| UNKNOWN_TRACK.to_string()),
                    entry
                        .artist
                        .and_then(|a| a.name)
                        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                )
            })
            .take(limit)
            .collect())
    }

    /// Names of similar artists in ranking order.
    pub async fn similar_artists(
        &self,
        artist: &str,
        limit: usize,
    ) -> Result<Vec<String>, ProviderError> {
        let limit_param = limit.to_string();
        let response: SimilarArtistsResponse = self
            .call("artist.getsimilar", &[("artist", artist), ("limit", &limit_param)])
            .await?;

        Ok(response
            .similarartists
            .map(|s| s.artist.into_vec())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.name)
            .take(limit)
            .collect())
    }
}
