//! Relative normalization and cosine similarity over the 20-dimensional trait space.

use crate::traits::{TraitKey, TraitProfile, TraitVector, TRAIT_COUNT};

/// Rescale raw counts into [0, 1] by dividing by the vector's own maximum.
///
/// This reflects which traits dominate for this entity rather than an absolute scale.
/// Empty or all-zero input yields the all-zero profile.
pub fn normalize_traits(traits: &TraitVector) -> TraitProfile {
    let max = match traits.max_value() {
        Some(m) if m > 0 => f64::from(m),
        _ => return TraitProfile::ZERO,
    };
    let mut out = [0.0; TRAIT_COUNT];
    for key in TraitKey::ALL {
        out[key.index()] = f64::from(traits.get(key)) / max;
    }
    TraitProfile(out)
}

/// Cosine similarity of two non-negative profiles, in [0, 1].
/// Returns 0.0 when either side is the null vector.
pub fn cosine_similarity(a: &TraitProfile, b: &TraitProfile) -> f64 {
    let dot: f64 = a.0.iter().zip(b.0.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.0.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.0.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}
