use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<TracksPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TracksPage {
    #[serde(default)]
    pub items: Vec<SpotifyTrack>,
}

/// A track from the search endpoint (only the fields we read)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub album: Option<SpotifyAlbum>,
    pub popularity: Option<u8>,
    pub external_urls: Option<ExternalUrls>,
    pub preview_url: Option<String>,
    pub duration_ms: Option<u64>,
}

impl SpotifyTrack {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }

    pub fn album_art(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|album| album.images.first())
            .map(|image| image.url.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotifyAlbum {
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// GET /audio-features/{id}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioFeatures {
    pub tempo: Option<f64>,
    /// -1 when Spotify could not detect a key
    pub key: Option<i64>,
    pub mode: Option<i64>,
    pub loudness: Option<f64>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
}

impl AudioFeatures {
    pub fn has_usable_tempo(&self) -> bool {
        self.tempo.is_some_and(|t| t > 0.0)
    }
}

/// GET /audio-analysis/{id}; only the track summary section is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioAnalysis {
    pub track: Option<AnalysisSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisSummary {
    pub tempo: Option<f64>,
    pub key: Option<i64>,
    pub mode: Option<i64>,
    pub loudness: Option<f64>,
}
