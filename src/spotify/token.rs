//! Client-credentials token cache shared by every Spotify call in the process.
//!
//! The whole check-expiry / exchange / store sequence runs under one async
//! mutex, so concurrent resolutions never exchange twice for the same
//! credentials and never observe a half-written token.

use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex as SyncMutex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::{
    SpotifyCredentials, MIN_TOKEN_SAFETY_MARGIN_SECONDS, TOKEN_SAFETY_MARGIN_SECONDS,
};
use crate::providers::ProviderError;

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Used to exercise token expiry.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<SyncMutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(SyncMutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        if let Some(next) = TimeDelta::from_std(by)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
        {
            *now = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Clone)]
struct Token {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

pub struct TokenCache {
    http: Client,
    token_url: String,
    safety_margin: TimeDelta,
    clock: Arc<dyn Clock>,
    token: Mutex<Option<Token>>,
    exchanges: AtomicU64,
}

impl TokenCache {
    pub fn new(http: Client, token_url: impl Into<String>, safety_margin: Duration) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            safety_margin: TimeDelta::from_std(
                safety_margin.max(Duration::from_secs(MIN_TOKEN_SAFETY_MARGIN_SECONDS)),
            )
            .unwrap_or(TimeDelta::seconds(TOKEN_SAFETY_MARGIN_SECONDS as i64)),
            clock: Arc::new(SystemClock),
            token: Mutex::new(None),
            exchanges: AtomicU64::new(0),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns a bearer token, exchanging credentials only when the cached
    /// one is missing or past its (margin-adjusted) expiry.
    pub async fn get_token(&self, credentials: &SpotifyCredentials) -> Result<String, ProviderError> {
        if !credentials.is_complete() {
            return Err(ProviderError::AuthConfig);
        }

        let mut guard = self.token.lock().await;
        let now = self.clock.now();

        if let Some(ref token) = *guard {
            if now < token.expires_at {
                return Ok(token.value.clone());
            }
            log::debug!("Spotify token expired at {}, refreshing", token.expires_at);
        }

        let token = self.exchange(credentials, now).await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next `get_token` exchanges again.
    pub async fn invalidate(&self) {
        let mut guard = self.token.lock().await;
        if guard.take().is_some() {
            log::info!("Spotify token invalidated");
        }
    }

    /// Number of client-credentials exchanges performed so far.
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    async fn exchange(
        &self,
        credentials: &SpotifyCredentials,
        now: DateTime<Utc>,
    ) -> Result<Token, ProviderError> {
        let basic = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            credentials.client_id, credentials.client_secret
        ));

        log::info!(
            "Exchanging Spotify client credentials (client id {})",
            credentials.masked_client_id()
        );
        self.exchanges.fetch_add(1, Ordering::Relaxed);

        let response = self
            .http
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Spotify token exchange failed ({})", status);
            return Err(ProviderError::AuthExchange {
                status: status.as_u16(),
                body,
            });
        }

        let body: TokenResponse = response.json().await?;
        let expires_at = self.expiry(now, body.expires_in)?;

        Ok(Token {
            value: body.access_token,
            expires_at,
        })
    }

    /// Margin-adjusted expiry for a token issued at `now`. `expires_in` comes
    /// from the remote response and is rejected when it is not a positive,
    /// representable lifetime.
    fn expiry(&self, now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>, ProviderError> {
        if expires_in <= 0 {
            return Err(ProviderError::Parse(format!("invalid expires_in {}", expires_in)));
        }
        TimeDelta::try_seconds(expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .and_then(|expires| expires.checked_sub_signed(self.safety_margin))
            .ok_or_else(|| ProviderError::Parse(format!("invalid expires_in {}", expires_in)))
    }
}
