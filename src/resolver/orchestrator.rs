use std::sync::Arc;

use crate::errors::ResolveError;
use crate::models::{FeatureField, FeatureQuery, NormalizedFeatureRecord, Provenance, RawProviderResult};
use crate::providers::{FeatureProvider, ProviderError, ProviderId};

use super::merge::apply_local_override;
use super::normalize::normalize;

/// Outcome of walking the provider chain.
struct BaseOutcome {
    base: Option<(ProviderId, RawProviderResult)>,
    causes: Vec<String>,
    upstream: bool,
}

/// Ordered fallback chain plus an optional local-analysis overlay.
///
/// The first chain provider to return `Ok` produces the base record; later
/// providers are not consulted. Provider errors are folded into the cause
/// chain and only surface when no base record was produced at all.
#[derive(Default)]
pub struct FeatureResolver {
    chain: Vec<Arc<dyn FeatureProvider>>,
    local: Option<Arc<dyn FeatureProvider>>,
}

impl FeatureResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn FeatureProvider>) {
        log::info!(
            "Registering feature provider: {} ({})",
            provider.name(),
            provider.id()
        );
        self.chain.push(provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn FeatureProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn with_local(mut self, local: Arc<dyn FeatureProvider>) -> Self {
        log::info!("Registering local analysis: {}", local.name());
        self.local = Some(local);
        self
    }

    pub fn chain(&self) -> Vec<ProviderId> {
        self.chain.iter().map(|p| p.id()).collect()
    }

    pub async fn resolve_and_merge(
        &self,
        query: &FeatureQuery,
    ) -> Result<NormalizedFeatureRecord, ResolveError> {
        log::info!("Resolving features for {} - {}", query.artist(), query.track());

        // The local overlay does not depend on the base record, so both run at once.
        let (outcome, local) = tokio::join!(self.resolve_base(query), self.resolve_local(query));

        let Some((base_id, mut raw)) = outcome.base else {
            log::warn!(
                "No provider produced a record for {} - {}",
                query.artist(),
                query.track()
            );
            let causes = outcome.causes;
            return Err(if outcome.upstream {
                ResolveError::Upstream { causes }
            } else {
                ResolveError::NoData { causes }
            });
        };

        let local_overrides: Vec<FeatureField> = match local {
            Some(local) => apply_local_override(&mut raw, &local),
            None => Vec::new(),
        };
        if !local_overrides.is_empty() {
            log::info!("Local analysis overrode {:?}", local_overrides);
        }

        Ok(normalize(
            raw,
            Provenance {
                base: base_id,
                local_overrides,
            },
            query,
        ))
    }

    async fn resolve_base(&self, query: &FeatureQuery) -> BaseOutcome {
        let mut outcome = BaseOutcome {
            base: None,
            causes: Vec::new(),
            upstream: false,
        };

        if self.chain.is_empty() {
            outcome
                .causes
                .push("no feature providers are configured".to_string());
            return outcome;
        }

        for provider in &self.chain {
            match provider.resolve(query).await {
                Ok(raw) => {
                    log::info!("{} produced the base record", provider.name());
                    outcome.base = Some((provider.id(), raw));
                    break;
                }
                Err(e) => {
                    log::warn!("{} failed, falling through: {}", provider.name(), e);
                    outcome.upstream |= e.is_upstream();
                    outcome.causes.push(format!("{}: {}", provider.id(), e));
                }
            }
        }

        outcome
    }

    async fn resolve_local(&self, query: &FeatureQuery) -> Option<RawProviderResult> {
        let audio = query.audio()?;
        let local = self.local.as_ref()?;

        if !audio.is_supported() {
            log::warn!(
                "Ignoring audio {}: only mp3, wav, m4a and flac are analyzed",
                audio.file_name()
            );
            return None;
        }

        match local.resolve(query).await {
            Ok(raw) => Some(raw),
            Err(ProviderError::AnalysisUnavailable) => {
                log::info!("Local analysis is not available, skipping override");
                None
            }
            Err(e) => {
                log::warn!("Local analysis failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioPayload;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        id: ProviderId,
        result: Result<RawProviderResult, ProviderError>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(id: ProviderId, result: Result<RawProviderResult, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                id,
                result,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeatureProvider for FakeProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn name(&self) -> &str {
            "fake"
        }

        async fn resolve(&self, _query: &FeatureQuery) -> Result<RawProviderResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn spotify_like() -> RawProviderResult {
        RawProviderResult {
            track: Some("Song".to_string()),
            artist: Some("Band".to_string()),
            tempo: Some(120.0),
            key: Some(0),
            mode: Some(1),
            energy: Some(0.6),
            loudness: Some(-6.0),
            duration_ms: Some(210_000),
            ..RawProviderResult::default()
        }
    }

    fn lastfm_like() -> RawProviderResult {
        RawProviderResult {
            track: Some("Song".to_string()),
            artist: Some("Band".to_string()),
            tempo: Some(120.0),
            energy: Some(0.8),
            valence: Some(0.8),
            tags: vec!["rock".to_string(), "party".to_string()],
            ..RawProviderResult::default()
        }
    }

    fn local_like() -> RawProviderResult {
        RawProviderResult {
            tempo: Some(128.0),
            key: Some(7),
            energy: Some(0.9),
            loudness: Some(-9.0),
            duration_ms: Some(200_000),
            ..RawProviderResult::default()
        }
    }

    fn query_with_audio(name: &str) -> FeatureQuery {
        FeatureQuery::new("Band", "Song")
            .unwrap()
            .with_audio(AudioPayload::new(name, vec![0u8; 16]))
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let spotify = FakeProvider::new(ProviderId::Spotify, Ok(spotify_like()));
        let lastfm = FakeProvider::new(ProviderId::LastFm, Ok(lastfm_like()));
        let resolver = FeatureResolver::new()
            .with_provider(spotify.clone())
            .with_provider(lastfm.clone());

        let record = resolver
            .resolve_and_merge(&FeatureQuery::new("Band", "Song").unwrap())
            .await
            .unwrap();

        assert_eq!(record.provenance.base, ProviderId::Spotify);
        assert_eq!(record.key, "C major");
        assert_eq!(record.duration_minutes, Some(3.5));
        assert_eq!(lastfm.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_lastfm() {
        let spotify = FakeProvider::new(
            ProviderId::Spotify,
            Err(ProviderError::Unavailable("no track".to_string())),
        );
        let lastfm = FakeProvider::new(ProviderId::LastFm, Ok(lastfm_like()));
        let resolver = FeatureResolver::new()
            .with_provider(spotify)
            .with_provider(lastfm);

        let record = resolver
            .resolve_and_merge(&FeatureQuery::new("Band", "Song").unwrap())
            .await
            .unwrap();

        assert_eq!(record.provenance.base, ProviderId::LastFm);
        assert_eq!(record.key, "Unknown");
        assert_eq!(record.loudness_db, None);
        assert_eq!(record.energy, Some(0.8));
        assert_eq!(record.tags, vec!["rock".to_string(), "party".to_string()]);
    }

    #[tokio::test]
    async fn test_local_override_policy() {
        let resolver = FeatureResolver::new()
            .with_provider(FakeProvider::new(ProviderId::Spotify, Ok(spotify_like())))
            .with_local(FakeProvider::new(ProviderId::Local, Ok(local_like())));

        let record = resolver
            .resolve_and_merge(&query_with_audio("take.mp3"))
            .await
            .unwrap();

        assert_eq!(record.tempo, Some(128.0));
        assert_eq!(record.key, "G");
        // Present base values win for the conditional fields.
        assert_eq!(record.energy, Some(0.6));
        assert_eq!(record.loudness_db, Some(-6.0));
        assert_eq!(record.duration_minutes, Some(3.5));
        assert_eq!(
            record.provenance.local_overrides,
            vec![FeatureField::Tempo, FeatureField::Key]
        );
    }

    #[tokio::test]
    async fn test_local_fills_lastfm_gaps() {
        let resolver = FeatureResolver::new()
            .with_provider(FakeProvider::new(ProviderId::LastFm, Ok(lastfm_like())))
            .with_local(FakeProvider::new(ProviderId::Local, Ok(local_like())));

        let record = resolver
            .resolve_and_merge(&query_with_audio("take.WAV"))
            .await
            .unwrap();

        assert_eq!(record.energy, Some(0.8));
        assert_eq!(record.loudness_db, Some(-9.0));
        assert_eq!(record.duration_minutes, Some(3.33));
        assert_eq!(record.provenance.base, ProviderId::LastFm);
    }

    #[tokio::test]
    async fn test_unsupported_audio_is_ignored() {
        let local = FakeProvider::new(ProviderId::Local, Ok(local_like()));
        let resolver = FeatureResolver::new()
            .with_provider(FakeProvider::new(ProviderId::Spotify, Ok(spotify_like())))
            .with_local(local.clone());

        let record = resolver
            .resolve_and_merge(&query_with_audio("clip.ogg"))
            .await
            .unwrap();

        assert_eq!(local.calls(), 0);
        assert_eq!(record.tempo, Some(120.0));
        assert!(record.provenance.local_overrides.is_empty());
    }

    #[tokio::test]
    async fn test_local_failure_is_contained() {
        let resolver = FeatureResolver::new()
            .with_provider(FakeProvider::new(ProviderId::Spotify, Ok(spotify_like())))
            .with_local(FakeProvider::new(
                ProviderId::Local,
                Err(ProviderError::Analysis("corrupt".to_string())),
            ));

        let record = resolver
            .resolve_and_merge(&query_with_audio("take.flac"))
            .await
            .unwrap();
        assert_eq!(record.tempo, Some(120.0));
        assert_eq!(record.key, "C major");
    }

    #[tokio::test]
    async fn test_total_failure_reports_cause_chain() {
        let resolver = FeatureResolver::new()
            .with_provider(FakeProvider::new(
                ProviderId::Spotify,
                Err(ProviderError::Unavailable("no track".to_string())),
            ))
            .with_provider(FakeProvider::new(ProviderId::LastFm, Err(ProviderError::AuthConfig)));

        let err = resolver
            .resolve_and_merge(&FeatureQuery::new("Band", "Song").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::NoData { .. }));
        assert_eq!(err.causes().len(), 2);
        assert!(err.causes()[0].starts_with("spotify:"));
        assert!(err.causes()[1].starts_with("lastfm:"));
    }

    #[tokio::test]
    async fn test_network_failure_is_upstream() {
        let resolver = FeatureResolver::new().with_provider(FakeProvider::new(
            ProviderId::Spotify,
            Err(ProviderError::Network("timed out".to_string())),
        ));

        let err = resolver
            .resolve_and_merge(&FeatureQuery::new("Band", "Song").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let err = FeatureResolver::new()
            .resolve_and_merge(&FeatureQuery::new("Band", "Song").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoData { .. }));
        assert_eq!(err.causes().len(), 1);
    }
}
