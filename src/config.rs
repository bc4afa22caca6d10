use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
pub const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";

pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const TOKEN_SAFETY_MARGIN_SECONDS: u64 = 60;
pub const MIN_TOKEN_SAFETY_MARGIN_SECONDS: u64 = 30;
pub const RECOMMENDATION_LIMIT: usize = 5;
pub const TOP_TAG_LIMIT: usize = 5;
pub const USER_AGENT: &str = concat!("trackscope/", env!("CARGO_PKG_VERSION"));

/// Client-credentials pair for the Spotify Web API.
#[derive(Clone, Serialize, Deserialize)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl SpotifyCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }

    /// Client id with everything but the first and last four characters hidden.
    pub fn masked_client_id(&self) -> String {
        let chars: Vec<char> = self.client_id.trim().chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.masked_client_id())
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Endpoints {
    pub spotify_token_url: String,
    pub spotify_api_base: String,
    pub lastfm_api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            spotify_token_url: SPOTIFY_TOKEN_URL.to_string(),
            spotify_api_base: SPOTIFY_API_BASE.to_string(),
            lastfm_api_base: LASTFM_API_BASE.to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub spotify: Option<SpotifyCredentials>,
    pub lastfm_api_key: Option<String>,
    pub endpoints: Endpoints,
    pub request_timeout: Duration,
    pub token_safety_margin: Duration,
    pub recommendation_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            spotify: None,
            lastfm_api_key: None,
            endpoints: Endpoints::default(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECONDS),
            token_safety_margin: Duration::from_secs(TOKEN_SAFETY_MARGIN_SECONDS),
            recommendation_limit: RECOMMENDATION_LIMIT,
        }
    }
}

impl PipelineConfig {
    /// Reads `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET` and `LASTFM_API_KEY`.
    /// Empty values are treated as unset.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let spotify = match (non_empty("SPOTIFY_CLIENT_ID"), non_empty("SPOTIFY_CLIENT_SECRET")) {
            (Some(id), Some(secret)) => Some(SpotifyCredentials::new(id, secret)),
            _ => None,
        };

        Self {
            spotify,
            lastfm_api_key: non_empty("LASTFM_API_KEY"),
            ..Self::default()
        }
    }

    pub fn spotify_configured(&self) -> bool {
        self.spotify.as_ref().is_some_and(SpotifyCredentials::is_complete)
    }

    /// Safety margin clamped to the 30s floor.
    pub fn effective_safety_margin(&self) -> Duration {
        self.token_safety_margin
            .max(Duration::from_secs(MIN_TOKEN_SAFETY_MARGIN_SECONDS))
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("spotify", &self.spotify)
            .field(
                "lastfm_api_key",
                &self.lastfm_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoints", &self.endpoints)
            .field("request_timeout", &self.request_timeout)
            .field("token_safety_margin", &self.token_safety_margin)
            .field("recommendation_limit", &self.recommendation_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let config = PipelineConfig {
            spotify: Some(SpotifyCredentials::new("abcd1234efgh5678", "topsecret")),
            lastfm_api_key: Some("lastfm-key".to_string()),
            ..PipelineConfig::default()
        };

        let printed = format!("{:?}", config);
        assert!(!printed.contains("topsecret"));
        assert!(!printed.contains("lastfm-key"));
        assert!(printed.contains("abcd...5678"));
    }

    #[test]
    fn test_incomplete_credentials() {
        let config = PipelineConfig {
            spotify: Some(SpotifyCredentials::new("id", "  ")),
            ..PipelineConfig::default()
        };
        assert!(!config.spotify_configured());
    }

    #[test]
    fn test_safety_margin_floor() {
        let config = PipelineConfig {
            token_safety_margin: Duration::from_secs(5),
            ..PipelineConfig::default()
        };
        assert_eq!(config.effective_safety_margin(), Duration::from_secs(30));
    }
}
