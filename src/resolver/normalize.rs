//! Turns a merged raw record into display-ready values.

use crate::models::{FeatureQuery, NormalizedFeatureRecord, Provenance, RawProviderResult};

pub const UNKNOWN_KEY: &str = "Unknown";

/// Pitch classes 0..=11, sharps and flats spelled together.
pub const KEY_NAMES: [&str; 12] = [
    "C",
    "C♯ / D♭",
    "D",
    "D♯ / E♭",
    "E",
    "F",
    "F♯ / G♭",
    "G",
    "G♯ / A♭",
    "A",
    "A♯ / B♭",
    "B",
];

pub fn key_to_name(key: Option<u8>, mode: Option<u8>) -> String {
    let Some(name) = key.and_then(|k| KEY_NAMES.get(k as usize)) else {
        return UNKNOWN_KEY.to_string();
    };

    match mode {
        Some(1) => format!("{} major", name),
        Some(0) => format!("{} minor", name),
        _ => name.to_string(),
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn ms_to_minutes(ms: u64) -> f64 {
    round_to(ms as f64 / 60_000.0, 2)
}

/// Identity fields are copied through; numeric fields are rounded; the key
/// integer never leaves this function.
pub fn normalize(
    raw: RawProviderResult,
    provenance: Provenance,
    query: &FeatureQuery,
) -> NormalizedFeatureRecord {
    let round4 = |v: f64| round_to(v, 4);

    NormalizedFeatureRecord {
        track: raw.track.unwrap_or_else(|| query.track().to_string()),
        artist: raw.artist.unwrap_or_else(|| query.artist().to_string()),
        album_art_url: raw.album_art_url,
        external_url: raw.external_url,
        preview_url: raw.preview_url,
        popularity: raw.popularity,
        tempo: raw.tempo.map(|t| round_to(t, 2)),
        key: key_to_name(raw.key, raw.mode),
        energy: raw.energy.map(round4),
        loudness_db: raw.loudness.map(|l| round_to(l, 2)),
        duration_minutes: raw.duration_ms.map(ms_to_minutes),
        danceability: raw.danceability.map(round4),
        valence: raw.valence.map(round4),
        acousticness: raw.acousticness.map(round4),
        tags: raw.tags,
        playcount: raw.playcount,
        listeners: raw.listeners,
        provenance,
    }
}
