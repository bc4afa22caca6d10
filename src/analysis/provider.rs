use std::sync::Arc;

use async_trait::async_trait;

use super::decoder::decode_mono;
use super::signal::{BasicAnalyzer, SignalAnalyzer, SignalFeatures};
use crate::models::{AudioPayload, FeatureQuery, RawProviderResult};
use crate::providers::{FeatureProvider, ProviderError, ProviderId};
use crate::resolver::normalize::round_to;

/// Derives features from user-supplied audio. Without an analyzer every
/// call reports `AnalysisUnavailable`.
#[derive(Clone)]
pub struct LocalAnalysisProvider {
    analyzer: Option<Arc<dyn SignalAnalyzer>>,
}

impl LocalAnalysisProvider {
    pub fn new(analyzer: Arc<dyn SignalAnalyzer>) -> Self {
        Self {
            analyzer: Some(analyzer),
        }
    }

    pub fn basic() -> Self {
        Self::new(Arc::new(BasicAnalyzer::new()))
    }

    pub fn unavailable() -> Self {
        Self { analyzer: None }
    }

    pub fn is_available(&self) -> bool {
        self.analyzer.is_some()
    }

    pub async fn analyze_payload(
        &self,
        payload: &AudioPayload,
    ) -> Result<RawProviderResult, ProviderError> {
        let analyzer = self
            .analyzer
            .clone()
            .ok_or(ProviderError::AnalysisUnavailable)?;

        log::info!(
            "Analyzing uploaded audio {} ({} bytes)",
            payload.file_name(),
            payload.len()
        );

        let bytes = payload.bytes();
        let extension = payload.extension();
        let features = tokio::task::spawn_blocking(move || {
            let decoded = decode_mono(bytes, extension.as_deref())?;
            analyzer.analyze(&decoded)
        })
        .await
        .map_err(|e| ProviderError::Analysis(format!("analysis task failed: {}", e)))??;

        log::debug!("Local analysis result: {:?}", features);
        Ok(to_raw(features))
    }
}

fn to_raw(features: SignalFeatures) -> RawProviderResult {
    RawProviderResult {
        tempo: features.tempo.map(f64::round),
        key: features.key.filter(|k| *k < 12),
        energy: Some(round_to(features.energy, 4)),
        loudness: Some(round_to(features.loudness_db, 2)),
        duration_ms: Some((features.duration_secs * 1000.0).round() as u64),
        ..RawProviderResult::default()
    }
}

#[async_trait]
impl FeatureProvider for LocalAnalysisProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Local
    }

    fn name(&self) -> &str {
        "Local analysis"
    }

    async fn resolve(&self, query: &FeatureQuery) -> Result<RawProviderResult, ProviderError> {
        match query.audio() {
            Some(payload) => self.analyze_payload(payload).await,
            None => Err(ProviderError::Analysis("no audio payload".to_string())),
        }
    }
}
