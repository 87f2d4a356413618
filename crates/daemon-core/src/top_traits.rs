//! Salient-trait extraction, independent of archetype assignment.

use crate::traits::{TraitKey, TraitVector};

/// Up to `top_n` traits whose raw value is at least `threshold`, highest first.
///
/// Equal values keep canonical trait order, so the result is reproducible.
pub fn top_traits(traits: &TraitVector, threshold: u32, top_n: usize) -> Vec<TraitKey> {
    let mut above: Vec<(TraitKey, u32)> = traits.iter().filter(|(_, v)| *v >= threshold).collect();
    above.sort_by(|a, b| b.1.cmp(&a.1));
    above.into_iter().take(top_n).map(|(k, _)| k).collect()
}
