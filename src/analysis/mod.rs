//! Local signal analysis of uploaded audio.

pub mod decoder;
pub mod provider;
pub mod signal;

pub use decoder::{decode_mono, DecodedAudio};
pub use provider::LocalAnalysisProvider;
pub use signal::{BasicAnalyzer, SignalAnalyzer, SignalFeatures};
