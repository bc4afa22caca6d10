//! Resolution orchestrator: provider fallback, local override, normalization.

pub mod merge;
pub mod normalize;
pub mod orchestrator;

pub use merge::apply_local_override;
pub use normalize::{key_to_name, normalize, KEY_NAMES};
pub use orchestrator::FeatureResolver;
