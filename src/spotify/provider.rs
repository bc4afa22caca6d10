use async_trait::async_trait;

use super::client::SpotifyClient;
use super::models::{AnalysisSummary, AudioFeatures, SpotifyTrack};
use crate::models::{mode_flag, pitch_class, FeatureQuery, RawProviderResult};
use crate::providers::{FeatureProvider, ProviderError, ProviderId};

pub struct SpotifyProvider {
    client: SpotifyClient,
}

impl SpotifyProvider {
    pub fn new(client: SpotifyClient) -> Self {
        Self { client }
    }

    /// Search strings, most specific first. Field filters are precise but
    /// miss on small metadata differences, so free text follows.
    pub fn search_queries(artist: &str, track: &str) -> Vec<String> {
        vec![
            format!("track:{} artist:{}", track, artist),
            format!("{} {}", track, artist),
            track.to_string(),
        ]
    }

    async fn find_track(&self, query: &FeatureQuery) -> Result<SpotifyTrack, ProviderError> {
        let queries = Self::search_queries(query.artist(), query.track());
        let mut answered = false;
        let mut last_error = None;

        for (idx, q) in queries.iter().enumerate() {
            log::debug!("[{}/{}] Spotify search: {}", idx + 1, queries.len(), q);

            match self.client.search_track(q).await {
                Ok(Some(track)) => {
                    log::info!(
                        "Spotify match: {} by {}",
                        track.name,
                        track.primary_artist().unwrap_or("?")
                    );
                    return Ok(track);
                }
                Ok(None) => answered = true,
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => {
                    log::warn!("[{}/{}] Spotify search failed: {}", idx + 1, queries.len(), e);
                    last_error = Some(e);
                }
            }
        }

        // Only report "not found" if Spotify actually answered at least once.
        if let (false, Some(e)) = (answered, last_error) {
            return Err(e);
        }

        Err(ProviderError::Unavailable(format!(
            "no Spotify track found for {} - {}",
            query.artist(),
            query.track()
        )))
    }

    /// Fills audio descriptors. Falls back from audio-features to the coarser
    /// audio-analysis summary; if both fail the record stays metadata-only.
    async fn fill_features(
        &self,
        track_id: &str,
        result: &mut RawProviderResult,
    ) -> Result<(), ProviderError> {
        match self.client.audio_features(track_id).await {
            Ok(features) => {
                let usable = features.has_usable_tempo();
                apply_features(result, &features);
                if usable {
                    return Ok(());
                }
                log::debug!("Audio features for {} have no usable tempo", track_id);
            }
            Err(e) if e.is_auth() => return Err(e),
            Err(e) => log::warn!("Audio features unavailable for {}: {}", track_id, e),
        }

        log::info!("Falling back to audio analysis for {}", track_id);
        match self.client.audio_analysis(track_id).await {
            Ok(analysis) => {
                if let Some(summary) = analysis.track {
                    apply_analysis(result, &summary);
                }
            }
            Err(e) if e.is_auth() => return Err(e),
            Err(e) => log::warn!(
                "Audio analysis unavailable for {}, returning metadata only: {}",
                track_id,
                e
            ),
        }

        Ok(())
    }
}

fn metadata_record(track: &SpotifyTrack) -> RawProviderResult {
    RawProviderResult {
        track: Some(track.name.clone()),
        artist: track.primary_artist().map(str::to_string),
        album_art_url: track.album_art().map(str::to_string),
        external_url: track
            .external_urls
            .as_ref()
            .and_then(|urls| urls.spotify.clone()),
        preview_url: track.preview_url.clone(),
        popularity: track.popularity.filter(|p| *p <= 100),
        duration_ms: track.duration_ms,
        ..RawProviderResult::default()
    }
}

fn apply_features(result: &mut RawProviderResult, features: &AudioFeatures) {
    result.tempo = features.tempo.filter(|t| *t > 0.0);
    result.key = pitch_class(features.key);
    result.mode = result.key.and(mode_flag(features.mode));
    result.loudness = features.loudness;
    result.energy = features.energy;
    result.danceability = features.danceability;
    result.valence = features.valence;
    result.acousticness = features.acousticness;
}

/// Fills only what audio-features left empty.
fn apply_analysis(result: &mut RawProviderResult, summary: &AnalysisSummary) {
    if result.tempo.is_none() {
        result.tempo = summary.tempo.filter(|t| *t > 0.0);
    }
    if result.key.is_none() {
        result.key = pitch_class(summary.key);
        result.mode = result.key.and(mode_flag(summary.mode));
    }
    if result.loudness.is_none() {
        result.loudness = summary.loudness;
    }
}

#[async_trait]
impl FeatureProvider for SpotifyProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Spotify
    }

    fn name(&self) -> &str {
        "Spotify"
    }

    async fn resolve(&self, query: &FeatureQuery) -> Result<RawProviderResult, ProviderError> {
        let track = self.find_track(query).await?;
        let mut result = metadata_record(&track);
        self.fill_features(&track.id, &mut result).await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_queries_most_specific_first() {
        let queries = SpotifyProvider::search_queries("Daft Punk", "Digital Love");
        assert_eq!(
            queries,
            vec![
                "track:Digital Love artist:Daft Punk",
                "Digital Love Daft Punk",
                "Digital Love",
            ]
        );
    }

    #[test]
    fn test_features_unknown_key_is_absent() {
        let mut result = RawProviderResult::default();
        apply_features(
            &mut result,
            &AudioFeatures {
                tempo: Some(120.0),
                key: Some(-1),
                mode: Some(1),
                ..AudioFeatures::default()
            },
        );
        assert_eq!(result.key, None);
        assert_eq!(result.mode, None);
        assert_eq!(result.tempo, Some(120.0));
    }

    #[test]
    fn test_analysis_only_fills_gaps() {
        let mut result = RawProviderResult {
            loudness: Some(-5.0),
            ..RawProviderResult::default()
        };
        apply_analysis(
            &mut result,
            &AnalysisSummary {
                tempo: Some(98.5),
                key: Some(9),
                mode: Some(0),
                loudness: Some(-9.0),
            },
        );
        assert_eq!(result.tempo, Some(98.5));
        assert_eq!(result.key, Some(9));
        assert_eq!(result.mode, Some(0));
        assert_eq!(result.loudness, Some(-5.0));
    }
}
