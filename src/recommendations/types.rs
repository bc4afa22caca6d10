//! Data types for the recommendation lookup.

use serde::{Deserialize, Serialize};

/// Artist label used when a recommendation came from the similar-artist
/// fallback and has no individual track artist.
pub const VARIOUS_ARTISTS: &str = "Various";

/// A recommended track, in the order the source ranked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarTrack {
    /// Track title (or artist name, for similar-artist fallbacks)
    pub name: String,
    /// Performing artist, or "Various"
    pub artist: String,
}

impl SimilarTrack {
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
        }
    }

    /// Whether this entry came from the similar-artist fallback.
    pub fn is_artist_fallback(&self) -> bool {
        self.artist == VARIOUS_ARTISTS
    }
}
