#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use trackscope::config::{Endpoints, PipelineConfig, SpotifyCredentials};
use trackscope::lastfm::{LastFmClient, LastFmProvider};
use trackscope::spotify::{SpotifyClient, SpotifyProvider, TokenCache};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/api/token";
pub const LASTFM_PATH: &str = "/2.0/";
pub const TRACK_ID: &str = "4uLU6hMCjMI75M1A2tKUQC";

/// "client-id:client-secret", base64
pub const BASIC_AUTH: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";

pub fn credentials() -> SpotifyCredentials {
    SpotifyCredentials::new("client-id", "client-secret")
}

pub fn token_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), TOKEN_PATH)
}

pub fn spotify_base(server: &MockServer) -> String {
    format!("{}/v1", server.uri())
}

pub fn lastfm_base(server: &MockServer) -> String {
    format!("{}{}", server.uri(), LASTFM_PATH)
}

pub fn config(server: &MockServer, spotify: bool, lastfm: bool) -> PipelineConfig {
    PipelineConfig {
        spotify: spotify.then(credentials),
        lastfm_api_key: lastfm.then(|| "test-key".to_string()),
        endpoints: Endpoints {
            spotify_token_url: token_url(server),
            spotify_api_base: spotify_base(server),
            lastfm_api_base: lastfm_base(server),
        },
        request_timeout: Duration::from_secs(5),
        ..PipelineConfig::default()
    }
}

pub fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

pub fn token_cache(server: &MockServer) -> Arc<TokenCache> {
    Arc::new(TokenCache::new(
        http(),
        token_url(server),
        Duration::from_secs(60),
    ))
}

pub fn spotify_provider(server: &MockServer, tokens: Arc<TokenCache>) -> SpotifyProvider {
    SpotifyProvider::new(SpotifyClient::new(
        http(),
        spotify_base(server),
        credentials(),
        tokens,
    ))
}

pub fn lastfm_provider(server: &MockServer) -> LastFmProvider {
    LastFmProvider::new(LastFmClient::new(http(), lastfm_base(server), "test-key"))
}

pub fn token_body(expires_in: i64) -> Value {
    json!({
        "access_token": "token-abc",
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(3600)))
        .mount(server)
        .await;
}

pub fn search_hit() -> Value {
    json!({
        "tracks": {
            "items": [{
                "id": TRACK_ID,
                "name": "Song",
                "artists": [{ "name": "Band" }, { "name": "Featured" }],
                "album": { "images": [
                    { "url": "https://i.scdn.co/image/large" },
                    { "url": "https://i.scdn.co/image/small" }
                ]},
                "popularity": 64,
                "external_urls": { "spotify": "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC" },
                "preview_url": null,
                "duration_ms": 210000
            }]
        }
    })
}

pub fn search_miss() -> Value {
    json!({ "tracks": { "items": [] } })
}

pub fn audio_features() -> Value {
    json!({
        "tempo": 128.034,
        "key": 1,
        "mode": 1,
        "loudness": -5.214,
        "energy": 0.73412,
        "danceability": 0.61,
        "valence": 0.4,
        "acousticness": 0.02
    })
}

pub fn audio_analysis() -> Value {
    json!({
        "meta": { "status_code": 0 },
        "track": { "tempo": 97.5, "key": 9, "mode": 0, "loudness": -8.3 }
    })
}

pub fn lastfm_track_info() -> Value {
    json!({
        "track": {
            "name": "Song",
            "url": "https://www.last.fm/music/Band/_/Song",
            "duration": "240000",
            "listeners": "1234",
            "playcount": "56789",
            "artist": { "name": "Band" },
            "album": { "image": [
                { "#text": "https://lastfm.freetls.fastly.net/small.png", "size": "small" },
                { "#text": "https://lastfm.freetls.fastly.net/xl.png", "size": "extralarge" }
            ]},
            "toptags": { "tag": [
                { "name": "Rock" },
                { "name": "party" },
                { "name": "indie" },
                { "name": "2010s" },
                { "name": "guitar" },
                { "name": "acoustic" }
            ]}
        }
    })
}

pub fn lastfm_error(code: i64, message: &str) -> Value {
    json!({ "error": code, "message": message })
}

pub fn similar_tracks() -> Value {
    json!({
        "similartracks": {
            "track": [
                { "name": "Other Song", "artist": { "name": "Other Band" } },
                { "name": "Third Song", "artist": { "name": "Third Band" } }
            ],
            "@attr": { "artist": "Band" }
        }
    })
}

pub fn no_similar_tracks() -> Value {
    json!({ "similartracks": { "track": [], "@attr": { "artist": "Band" } } })
}

pub fn similar_artists() -> Value {
    json!({
        "similarartists": {
            "artist": [{ "name": "Kindred" }, { "name": "Nearby" }]
        }
    })
}

/// Mono 16-bit WAV of a sine tone.
pub fn sine_wav(freq: f32, seconds: f32, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let n = (seconds * sample_rate as f32) as usize;
        for i in 0..n {
            let t = i as f32 / sample_rate as f32;
            let s = 0.5 * (2.0 * std::f32::consts::PI * freq * t).sin();
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
