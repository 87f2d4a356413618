//! Archetype catalog: eight hand-authored personality prototypes.
//!
//! Each archetype is a centroid in the normalized trait space plus a tone descriptor used
//! verbatim in prompts and presentation hints passed through to the UI untouched.
//! The catalog is a process-wide `static`; declaration order is significant (it is the
//! tie-break order for equal similarity).

use crate::traits::TraitProfile;
use std::collections::BTreeMap;

/// Archetype used whenever an unknown or missing id is encountered.
pub const DEFAULT_ARCHETYPE_ID: &str = "seeker";

/// UX metadata keys understood by the presentation layer.
pub const UX_COLOR: &str = "color";
pub const UX_EMOJI: &str = "emoji";
pub const UX_ANIMATION: &str = "animation";

/// Immutable definition of a Daemon personality archetype.
#[derive(Debug)]
pub struct ArchetypeDefinition {
    /// Unique lowercase identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Normalized trait values (0.0 - 1.0) for all 20 traits, canonical order.
    pub centroid: TraitProfile,
    /// Tone descriptor embedded in generated text.
    pub tone_profile: &'static str,
    /// Presentation hints (color, emoji, animation). Opaque to the engine.
    pub ux_metadata: &'static [(&'static str, &'static str)],
}

impl ArchetypeDefinition {
    /// Presentation hint by key, if the archetype defines it.
    pub fn ux_hint(&self, key: &str) -> Option<&'static str> {
        self.ux_metadata
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Presentation hints as an owned map (for serialization).
    pub fn ux_map(&self) -> BTreeMap<String, String> {
        self.ux_metadata
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

// Centroid rows follow TraitKey::ALL:
// Intelligence, Creativity, Empathy, Resilience, Curiosity,
// Humor, Kindness, Confidence, Discipline, Honesty,
// Patience, Optimism, Courage, OpenMindedness, Prudence,
// Adaptability, Gratitude, Ambition, Humility, Playfulness

/// The eight archetypes, in tie-break order.
#[rustfmt::skip]
pub static ARCHETYPES: [ArchetypeDefinition; 8] = [
    ArchetypeDefinition {
        id: "guardian",
        name: "Guardian",
        centroid: TraitProfile([
            0.6, 0.4, 0.9, 0.8, 0.5,
            0.4, 0.9, 0.6, 0.7, 0.8,
            0.9, 0.6, 0.7, 0.6, 0.8,
            0.6, 0.8, 0.4, 0.8, 0.3,
        ]),
        tone_profile: "protective, nurturing, reliable, speaks with gentle wisdom and care",
        ux_metadata: &[(UX_COLOR, "#4A90E2"), (UX_EMOJI, "🛡️"), (UX_ANIMATION, "steady-glow")],
    },
    ArchetypeDefinition {
        id: "trickster",
        name: "Trickster",
        centroid: TraitProfile([
            0.7, 0.9, 0.5, 0.6, 0.8,
            0.9, 0.5, 0.8, 0.3, 0.4,
            0.3, 0.7, 0.8, 0.8, 0.2,
            0.8, 0.4, 0.6, 0.3, 0.9,
        ]),
        tone_profile: "mischievous, witty, chaotic, loves wordplay and playful teasing",
        ux_metadata: &[(UX_COLOR, "#9B59B6"), (UX_EMOJI, "🃏"), (UX_ANIMATION, "bounce-spin")],
    },
    ArchetypeDefinition {
        id: "sage",
        name: "Sage",
        centroid: TraitProfile([
            0.9, 0.6, 0.6, 0.7, 0.8,
            0.4, 0.6, 0.7, 0.8, 0.9,
            0.8, 0.5, 0.6, 0.9, 0.8,
            0.7, 0.6, 0.5, 0.7, 0.2,
        ]),
        tone_profile: "analytical, wise, measured, speaks with clarity and philosophical depth",
        ux_metadata: &[(UX_COLOR, "#2ECC71"), (UX_EMOJI, "📚"), (UX_ANIMATION, "pulse-glow")],
    },
    ArchetypeDefinition {
        id: "oracle",
        name: "Oracle",
        centroid: TraitProfile([
            0.7, 0.8, 0.8, 0.6, 0.9,
            0.5, 0.7, 0.6, 0.5, 0.7,
            0.7, 0.7, 0.6, 0.9, 0.6,
            0.8, 0.7, 0.5, 0.6, 0.5,
        ]),
        tone_profile: "intuitive, mysterious, insightful, speaks in riddles and deep observations",
        ux_metadata: &[(UX_COLOR, "#8E44AD"), (UX_EMOJI, "🔮"), (UX_ANIMATION, "shimmer-fade")],
    },
    ArchetypeDefinition {
        id: "rebel",
        name: "Rebel",
        centroid: TraitProfile([
            0.6, 0.7, 0.4, 0.8, 0.7,
            0.6, 0.4, 0.9, 0.4, 0.7,
            0.3, 0.6, 0.9, 0.7, 0.3,
            0.7, 0.3, 0.9, 0.2, 0.6,
        ]),
        tone_profile: "bold, defiant, direct, challenges conventions with edgy confidence",
        ux_metadata: &[(UX_COLOR, "#E74C3C"), (UX_EMOJI, "⚡"), (UX_ANIMATION, "sharp-flash")],
    },
    ArchetypeDefinition {
        id: "diplomat",
        name: "Diplomat",
        centroid: TraitProfile([
            0.7, 0.5, 0.9, 0.6, 0.6,
            0.5, 0.9, 0.7, 0.7, 0.8,
            0.9, 0.7, 0.6, 0.9, 0.8,
            0.8, 0.8, 0.5, 0.8, 0.4,
        ]),
        tone_profile: "tactful, harmonious, balanced, speaks with diplomatic grace and understanding",
        ux_metadata: &[(UX_COLOR, "#3498DB"), (UX_EMOJI, "🕊️"), (UX_ANIMATION, "smooth-wave")],
    },
    ArchetypeDefinition {
        id: "seeker",
        name: "Seeker",
        centroid: TraitProfile([
            0.6, 0.7, 0.6, 0.6, 0.9,
            0.6, 0.6, 0.6, 0.5, 0.7,
            0.6, 0.8, 0.7, 0.9, 0.5,
            0.9, 0.7, 0.7, 0.6, 0.7,
        ]),
        tone_profile: "curious, adventurous, enthusiastic, always discovering and questioning",
        ux_metadata: &[(UX_COLOR, "#F39C12"), (UX_EMOJI, "🔍"), (UX_ANIMATION, "search-sweep")],
    },
    ArchetypeDefinition {
        id: "jester",
        name: "Jester",
        centroid: TraitProfile([
            0.6, 0.8, 0.6, 0.5, 0.7,
            0.9, 0.7, 0.7, 0.3, 0.6,
            0.4, 0.9, 0.6, 0.7, 0.3,
            0.7, 0.7, 0.4, 0.5, 0.9,
        ]),
        tone_profile: "jovial, lighthearted, entertaining, turns everything into comedy gold",
        ux_metadata: &[(UX_COLOR, "#E67E22"), (UX_EMOJI, "🎭"), (UX_ANIMATION, "wiggle-bounce")],
    },
];

/// Look up an archetype by id (exact, lowercase).
pub fn find_archetype(id: &str) -> Option<&'static ArchetypeDefinition> {
    ARCHETYPES.iter().find(|a| a.id == id)
}

/// The designated fallback archetype.
pub fn default_archetype() -> &'static ArchetypeDefinition {
    find_archetype(DEFAULT_ARCHETYPE_ID).unwrap_or(&ARCHETYPES[0])
}

/// Look up an archetype by id, substituting the default for unknown or missing ids.
pub fn archetype_or_default(id: Option<&str>) -> &'static ArchetypeDefinition {
    id.and_then(find_archetype).unwrap_or_else(default_archetype)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TraitKey;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_eight_unique_lowercase_ids() {
        assert_eq!(ARCHETYPES.len(), 8);
        let ids: HashSet<&str> = ARCHETYPES.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), 8);
        for a in ARCHETYPES.iter() {
            assert_eq!(a.id, a.id.to_lowercase(), "id '{}' must be lowercase", a.id);
        }
    }

    #[test]
    fn test_centroid_values_in_range() {
        for a in ARCHETYPES.iter() {
            for (key, v) in a.centroid.iter() {
                assert!((0.0..=1.0).contains(&v), "{}.{} = {}", a.id, key, v);
            }
            assert!(!a.centroid.is_zero());
        }
    }

    #[test]
    fn test_default_archetype_is_in_catalog() {
        assert!(find_archetype(DEFAULT_ARCHETYPE_ID).is_some());
        assert_eq!(default_archetype().id, "seeker");
    }

    #[test]
    fn test_archetype_or_default_falls_back() {
        assert_eq!(archetype_or_default(Some("sage")).name, "Sage");
        assert_eq!(archetype_or_default(Some("Sage")).id, DEFAULT_ARCHETYPE_ID);
        assert_eq!(archetype_or_default(Some("nope")).id, DEFAULT_ARCHETYPE_ID);
        assert_eq!(archetype_or_default(None).id, DEFAULT_ARCHETYPE_ID);
    }

    #[test]
    fn test_every_archetype_has_ux_hints() {
        for a in ARCHETYPES.iter() {
            assert!(a.ux_hint(UX_COLOR).is_some_and(|c| c.starts_with('#')));
            assert!(a.ux_hint(UX_EMOJI).is_some());
            assert!(a.ux_hint(UX_ANIMATION).is_some());
            assert_eq!(a.ux_map().len(), 3);
        }
    }

    #[test]
    fn test_jester_centroid_spot_values() {
        let jester = find_archetype("jester").unwrap();
        assert_eq!(jester.centroid.get(TraitKey::Humor), 0.9);
        assert_eq!(jester.centroid.get(TraitKey::Playfulness), 0.9);
        assert_eq!(jester.centroid.get(TraitKey::Creativity), 0.8);
    }
}
