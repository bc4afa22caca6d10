pub mod error;
pub mod traits;
pub mod types;

pub use error::ProviderError;
pub use traits::FeatureProvider;
pub use types::ProviderId;
