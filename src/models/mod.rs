use crate::errors::ResolveError;
use crate::providers::ProviderId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// File extensions the local analyzer accepts.
pub const ACCEPTED_AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "wav", "m4a", "flac"];

/// Raw uploaded audio plus the file name it arrived with.
#[derive(Clone)]
pub struct AudioPayload {
    file_name: String,
    bytes: Arc<[u8]>,
}

impl AudioPayload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> Arc<[u8]> {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn is_supported(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ACCEPTED_AUDIO_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl std::fmt::Debug for AudioPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPayload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// A validated (artist, track) lookup. Immutable once built.
#[derive(Debug, Clone)]
pub struct FeatureQuery {
    artist: String,
    track: String,
    audio: Option<AudioPayload>,
}

impl FeatureQuery {
    /// Trims both fields and rejects empty values before anything touches the network.
    pub fn new(artist: &str, track: &str) -> Result<Self, ResolveError> {
        let artist = artist.trim();
        let track = track.trim();

        match (artist.is_empty(), track.is_empty()) {
            (true, true) => Err(ResolveError::MissingInput(
                "artist and track are required".to_string(),
            )),
            (true, false) => Err(ResolveError::MissingInput("artist is required".to_string())),
            (false, true) => Err(ResolveError::MissingInput("track is required".to_string())),
            (false, false) => Ok(Self {
                artist: artist.to_string(),
                track: track.to_string(),
                audio: None,
            }),
        }
    }

    pub fn with_audio(mut self, audio: AudioPayload) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn track(&self) -> &str {
        &self.track
    }

    pub fn audio(&self) -> Option<&AudioPayload> {
        self.audio.as_ref()
    }
}

/// Sparse record produced by a single provider. `None` means the provider
/// could not determine that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProviderResult {
    pub track: Option<String>,
    pub artist: Option<String>,
    pub album_art_url: Option<String>,
    pub external_url: Option<String>,
    pub preview_url: Option<String>,
    pub popularity: Option<u8>,
    /// BPM
    pub tempo: Option<f64>,
    /// Pitch class 0-11
    pub key: Option<u8>,
    /// 0 = minor, 1 = major
    pub mode: Option<u8>,
    /// dB, usually negative
    pub loudness: Option<f64>,
    pub duration_ms: Option<u64>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub playcount: Option<u64>,
    pub listeners: Option<u64>,
}

/// Maps a provider's raw key integer to a pitch class. Sentinels such as -1 become `None`.
pub fn pitch_class(raw: Option<i64>) -> Option<u8> {
    raw.filter(|k| (0..=11).contains(k)).map(|k| k as u8)
}

/// Maps a provider's raw mode integer; anything other than 0 or 1 becomes `None`.
pub fn mode_flag(raw: Option<i64>) -> Option<u8> {
    raw.filter(|m| *m == 0 || *m == 1).map(|m| m as u8)
}

/// Fields the local analysis can replace in a base record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureField {
    Tempo,
    Key,
    Energy,
    Loudness,
    Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Provider that produced the base record
    pub base: ProviderId,
    /// Fields replaced by local analysis, in application order
    pub local_overrides: Vec<FeatureField>,
}

/// Merged, display-ready output of a resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeatureRecord {
    pub track: String,
    pub artist: String,
    pub album_art_url: Option<String>,
    pub external_url: Option<String>,
    pub preview_url: Option<String>,
    pub popularity: Option<u8>,
    pub tempo: Option<f64>,
    /// Note name such as "C♯ / D♭ major", or "Unknown"
    pub key: String,
    pub energy: Option<f64>,
    pub loudness_db: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub tags: Vec<String>,
    pub playcount: Option<u64>,
    pub listeners: Option<u64>,
    pub provenance: Provenance,
}
