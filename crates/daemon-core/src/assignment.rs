//! Archetype assignment: nearest centroid by cosine similarity, with hysteresis.
//!
//! The engine is stateless. The caller persists the entity's current archetype id and
//! passes it back on the next call; a switch only happens when the new best match beats
//! the current archetype by at least the hysteresis margin.

use crate::archetypes::{find_archetype, ArchetypeDefinition, ARCHETYPES};
use crate::similarity::{cosine_similarity, normalize_traits};
use crate::traits::TraitVector;
use serde::Serialize;

/// Minimum similarity improvement required before switching archetypes.
pub const DEFAULT_HYSTERESIS_MARGIN: f64 = 0.15;

/// Archetype chosen for a trait vector and its similarity score in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResult {
    pub archetype_id: &'static str,
    pub similarity: f64,
}

/// Similarity of one archetype against a normalized trait vector.
#[derive(Debug, Clone, Copy)]
pub struct ArchetypeScore {
    pub archetype: &'static ArchetypeDefinition,
    pub similarity: f64,
}

/// Score every archetype and sort by similarity, highest first.
///
/// The sort is stable, so archetypes with equal similarity keep catalog declaration
/// order: the first-declared archetype wins a tie.
pub fn rank_archetypes(traits: &TraitVector) -> Vec<ArchetypeScore> {
    let normalized = normalize_traits(traits);
    let mut scores: Vec<ArchetypeScore> = ARCHETYPES
        .iter()
        .map(|archetype| ArchetypeScore {
            archetype,
            similarity: cosine_similarity(&normalized, &archetype.centroid),
        })
        .collect();
    scores.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scores
}

/// Assign an archetype to a trait vector.
///
/// - `current_archetype_id`: previously assigned archetype, if any. Ids outside the
///   catalog are ignored (no hysteresis).
/// - `margin`: the best match must exceed the current archetype's score by at least this
///   much, otherwise the current archetype is kept with its own score.
pub fn assign_archetype(
    traits: &TraitVector,
    current_archetype_id: Option<&str>,
    margin: f64,
) -> AssignmentResult {
    let ranked = rank_archetypes(traits);
    let best = ranked[0];

    if let Some(current) = current_archetype_id.and_then(find_archetype) {
        let current_score = ranked
            .iter()
            .find(|s| s.archetype.id == current.id)
            .map(|s| s.similarity)
            .unwrap_or(0.0);
        if best.similarity - current_score < margin {
            if best.archetype.id != current.id {
                tracing::debug!(
                    target: "daemon::assignment",
                    current = current.id,
                    candidate = best.archetype.id,
                    gap = best.similarity - current_score,
                    margin,
                    "Keeping current archetype (gap below margin)"
                );
            }
            return AssignmentResult {
                archetype_id: current.id,
                similarity: current_score,
            };
        }
        tracing::debug!(
            target: "daemon::assignment",
            from = current.id,
            to = best.archetype.id,
            gap = best.similarity - current_score,
            "Switching archetype"
        );
    } else if let Some(unknown) = current_archetype_id {
        tracing::debug!(target: "daemon::assignment", archetype_id = unknown, "Ignoring unknown current archetype");
    }

    AssignmentResult {
        archetype_id: best.archetype.id,
        similarity: best.similarity,
    }
}

/// Decide whether a persisted archetype should be overwritten with a newly computed one.
///
/// Always true without a current archetype; false when unchanged; otherwise the new
/// archetype's score must reach `min_similarity`.
pub fn should_update_archetype(
    current_archetype_id: Option<&str>,
    new_archetype_id: &str,
    similarity_score: f64,
    min_similarity: f64,
) -> bool {
    match current_archetype_id.filter(|s| !s.is_empty()) {
        None => true,
        Some(current) if current != new_archetype_id => similarity_score >= min_similarity,
        Some(_) => false,
    }
}
