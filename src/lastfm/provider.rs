use async_trait::async_trait;

use super::client::LastFmClient;
use super::heuristics::estimate_from_tags;
use super::models::LastFmTrack;
use crate::config::TOP_TAG_LIMIT;
use crate::models::{FeatureQuery, RawProviderResult};
use crate::providers::{FeatureProvider, ProviderError, ProviderId};
use crate::recommendations::types::{SimilarTrack, VARIOUS_ARTISTS};

pub struct LastFmProvider {
    client: LastFmClient,
    tag_limit: usize,
}

impl LastFmProvider {
    pub fn new(client: LastFmClient) -> Self {
        Self {
            client,
            tag_limit: TOP_TAG_LIMIT,
        }
    }

    /// Similar tracks for (artist, track). When Last.fm knows no similar
    /// tracks, similar artists are returned instead, labelled "Various"
    /// since that endpoint does not resolve individual performers.
    pub async fn find_similar(
        &self,
        artist: &str,
        track: &str,
        limit: usize,
    ) -> Result<Vec<SimilarTrack>, ProviderError> {
        match self.client.similar_tracks(artist, track, limit).await {
            Ok(tracks) if !tracks.is_empty() => return Ok(tracks),
            Ok(_) => log::info!(
                "No similar tracks for {} - {}, trying similar artists",
                artist,
                track
            ),
            Err(e) => log::warn!(
                "Similar track lookup failed for {} - {} ({}), trying similar artists",
                artist,
                track,
                e
            ),
        }

        let artists = self.client.similar_artists(artist, limit).await?;
        Ok(artists
            .into_iter()
            .map(|name| SimilarTrack::new(name, VARIOUS_ARTISTS))
            .collect())
    }

    fn build_result(&self, query: &FeatureQuery, info: LastFmTrack) -> RawProviderResult {
        let tags: Vec<String> = info
            .tag_names()
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        let estimate = estimate_from_tags(&tags);

        RawProviderResult {
            track: Some(info.name.clone().unwrap_or_else(|| query.track().to_string())),
            artist: Some(
                info.artist
                    .as_ref()
                    .and_then(|a| a.name.clone())
                    .unwrap_or_else(|| query.artist().to_string()),
            ),
            album_art_url: info.album_art(),
            external_url: info.url.clone(),
            duration_ms: info.duration.filter(|d| *d > 0),
            energy: Some(estimate.energy),
            danceability: Some(estimate.danceability),
            valence: Some(estimate.valence),
            acousticness: Some(estimate.acousticness),
            tempo: Some(estimate.tempo),
            tags: tags.into_iter().take(self.tag_limit).collect(),
            playcount: info.playcount,
            listeners: info.listeners,
            ..RawProviderResult::default()
        }
    }

    /// Weak-but-usable result when Last.fm could not be reached or knew nothing.
    fn empty_result(query: &FeatureQuery) -> RawProviderResult {
        RawProviderResult {
            track: Some(query.track().to_string()),
            artist: Some(query.artist().to_string()),
            ..RawProviderResult::default()
        }
    }
}

#[async_trait]
impl FeatureProvider for LastFmProvider {
    fn id(&self) -> ProviderId {
        ProviderId::LastFm
    }

    fn name(&self) -> &str {
        "Last.fm"
    }

    /// Never returns `Err`: any failure yields a record with no tags and no estimates.
    async fn resolve(&self, query: &FeatureQuery) -> Result<RawProviderResult, ProviderError> {
        log::info!(
            "Fetching Last.fm info for {} - {}",
            query.artist(),
            query.track()
        );

        match self.client.track_info(query.artist(), query.track()).await {
            Ok(info) => Ok(self.build_result(query, info)),
            Err(e) => {
                log::warn!("Last.fm track info failed: {}", e);
                Ok(Self::empty_result(query))
            }
        }
    }
}
