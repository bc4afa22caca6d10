//! Local-analysis override policy.
//!
//! Tempo and key are measured from the actual audio, so a local value always
//! replaces the base value. Energy, loudness and duration only fill a base
//! field that is missing or zero.

use crate::models::{FeatureField, RawProviderResult};

fn is_unset_f64(value: Option<f64>) -> bool {
    value.map_or(true, |v| v == 0.0)
}

fn is_unset_u64(value: Option<u64>) -> bool {
    value.map_or(true, |v| v == 0)
}

/// Applies `local` on top of `base` and returns the fields that changed hands,
/// in application order.
pub fn apply_local_override(
    base: &mut RawProviderResult,
    local: &RawProviderResult,
) -> Vec<FeatureField> {
    let mut applied = Vec::new();

    if let Some(tempo) = local.tempo {
        base.tempo = Some(tempo);
        applied.push(FeatureField::Tempo);
    }

    if let Some(key) = local.key {
        base.key = Some(key);
        // Local analysis does not infer mode; a remote mode no longer describes this key.
        base.mode = local.mode;
        applied.push(FeatureField::Key);
    }

    if let Some(energy) = local.energy {
        if is_unset_f64(base.energy) {
            base.energy = Some(energy);
            applied.push(FeatureField::Energy);
        }
    }

    if let Some(loudness) = local.loudness {
        if is_unset_f64(base.loudness) {
            base.loudness = Some(loudness);
            applied.push(FeatureField::Loudness);
        }
    }

    if let Some(duration) = local.duration_ms {
        if is_unset_u64(base.duration_ms) {
            base.duration_ms = Some(duration);
            applied.push(FeatureField::Duration);
        }
    }

    applied
}
