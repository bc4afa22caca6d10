//! Recommendation engine for the analysis report.
//!
//! Looks up similar tracks on Last.fm (falling back to similar artists) and
//! keeps the results in a small in-memory TTL cache. Lookups never fail from
//! the caller's point of view: any error is logged and yields an empty list.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::RECOMMENDATION_LIMIT;
use crate::lastfm::LastFmProvider;
use crate::recommendations::errors::RecommendationError;
use crate::recommendations::types::SimilarTrack;

/// How long cached recommendation lists remain valid.
const CACHE_TTL: Duration = Duration::from_secs(5 * 60); // 5 minutes

/// Maximum number of cached lists before evicting oldest entries.
const MAX_CACHE_ENTRIES: usize = 50;

struct CachedRecommendations {
    tracks: Vec<SimilarTrack>,
    cached_at: Instant,
}

impl CachedRecommendations {
    fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > CACHE_TTL
    }
}

pub struct RecommendationEngine {
    lastfm: Option<Arc<LastFmProvider>>,
    limit: usize,
    cache: Mutex<HashMap<String, CachedRecommendations>>,
}

impl RecommendationEngine {
    pub fn new(lastfm: Option<Arc<LastFmProvider>>, limit: usize) -> Self {
        Self {
            lastfm,
            limit: if limit == 0 { RECOMMENDATION_LIMIT } else { limit },
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Engine with no source; every lookup returns an empty list.
    pub fn disabled() -> Self {
        Self::new(None, RECOMMENDATION_LIMIT)
    }

    pub fn is_enabled(&self) -> bool {
        self.lastfm.is_some()
    }

    /// Similar tracks for (artist, track), best match first. Possibly empty.
    pub async fn find_similar(&self, artist: &str, track: &str) -> Vec<SimilarTrack> {
        match self.lookup(artist, track).await {
            Ok(tracks) => tracks,
            Err(RecommendationError::NotConfigured) => {
                log::debug!("Recommendations disabled: no Last.fm API key");
                Vec::new()
            }
            Err(e) => {
                log::warn!(
                    "Recommendation lookup failed for {} - {}: {}",
                    artist,
                    track,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Cached lookup that reports why nothing came back.
    pub async fn lookup(
        &self,
        artist: &str,
        track: &str,
    ) -> Result<Vec<SimilarTrack>, RecommendationError> {
        let lastfm = self
            .lastfm
            .as_ref()
            .ok_or(RecommendationError::NotConfigured)?;

        let cache_key = Self::cache_key(artist, track);
        if let Some(tracks) = self.cached(&cache_key) {
            log::debug!("Memory cache hit for {} - {}", artist, track);
            return Ok(tracks);
        }

        let tracks = lastfm.find_similar(artist, track, self.limit).await?;
        log::info!(
            "Found {} recommendations for {} - {}",
            tracks.len(),
            artist,
            track
        );

        self.store(cache_key, tracks.clone());
        Ok(tracks)
    }

    fn cache_key(artist: &str, track: &str) -> String {
        format!(
            "{}|{}",
            artist.trim().to_lowercase(),
            track.trim().to_lowercase()
        )
    }

    fn cached(&self, key: &str) -> Option<Vec<SimilarTrack>> {
        let cache = self.cache.lock();
        cache
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.tracks.clone())
    }

    fn store(&self, key: String, tracks: Vec<SimilarTrack>) {
        let mut cache = self.cache.lock();
        Self::evict_expired(&mut cache);
        if cache.len() >= MAX_CACHE_ENTRIES && !cache.contains_key(&key) {
            if let Some(oldest_key) = cache
                .iter()
                .min_by_key(|(_, v)| v.cached_at)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest_key);
            }
        }
        cache.insert(
            key,
            CachedRecommendations {
                tracks,
                cached_at: Instant::now(),
            },
        );
    }

    /// Remove all expired entries from the cache.
    fn evict_expired(cache: &mut HashMap<String, CachedRecommendations>) {
        cache.retain(|_, v| !v.is_expired());
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
        log::info!("Recommendation cache cleared");
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().len()
    }
}
