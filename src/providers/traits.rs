use super::error::ProviderError;
use super::types::ProviderId;
use crate::models::{FeatureQuery, RawProviderResult};
use async_trait::async_trait;

#[async_trait]
pub trait FeatureProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// User-friendly name
    fn name(&self) -> &str;

    /// Produce a sparse feature record for the query.
    async fn resolve(&self, query: &FeatureQuery) -> Result<RawProviderResult, ProviderError>;
}
