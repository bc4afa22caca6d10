//! Last.fm JSON shapes.
//!
//! Last.fm encodes counts as strings, collapses one-element lists into a bare
//! object, and sometimes sends an empty string where an object is expected.
//! Every nested field here is parsed leniently; a malformed section becomes
//! `None` rather than failing the whole response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// Error envelope returned with HTTP 200 for unknown tracks, bad keys, etc.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackInfoResponse {
    pub track: LastFmTrack,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastFmTrack {
    pub name: Option<String>,
    pub url: Option<String>,
    /// Milliseconds
    #[serde(default, deserialize_with = "lenient_count")]
    pub duration: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub listeners: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub playcount: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub artist: Option<ArtistRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub album: Option<LastFmAlbum>,
    #[serde(default, deserialize_with = "lenient")]
    pub toptags: Option<TopTags>,
}

impl LastFmTrack {
    /// Tag names in Last.fm's ranking order.
    pub fn tag_names(&self) -> Vec<String> {
        self.toptags
            .clone()
            .map(|t| t.tag.into_vec())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tag| tag.name)
            .collect()
    }

    /// Largest non-empty album image.
    pub fn album_art(&self) -> Option<String> {
        self.album
            .as_ref()
            .and_then(|album| {
                album
                    .image
                    .clone()
                    .into_vec()
                    .into_iter()
                    .rev()
                    .find_map(|img| img.url.filter(|u| !u.is_empty()))
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastFmAlbum {
    #[serde(default)]
    pub image: OneOrMany<LastFmImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastFmImage {
    #[serde(rename = "#text")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopTags {
    #[serde(default)]
    pub tag: OneOrMany<LastFmTag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastFmTag {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarTracksResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub similartracks: Option<SimilarTracks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimilarTracks {
    #[serde(default)]
    pub track: OneOrMany<SimilarTrackEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimilarTrackEntry {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub artist: Option<ArtistRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarArtistsResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub similarartists: Option<SimilarArtists>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimilarArtists {
    #[serde(default)]
    pub artist: OneOrMany<ArtistRef>,
}
