//! Personality context builder: archetype + dominant traits → prompt text and UI payload.
//!
//! This is the entry point for turning raw trait data into a structured personality.
//! It performs no I/O and never fails; unknown archetype ids resolve to the default.

use crate::archetypes::{archetype_or_default, ArchetypeDefinition, UX_COLOR, UX_EMOJI};
use crate::assignment::{assign_archetype, AssignmentResult};
use crate::config::PersonaConfig;
use crate::top_traits::top_traits;
use crate::traits::{TraitKey, TraitVector};
use serde::Serialize;
use std::collections::BTreeMap;

/// UI emoji when the archetype does not define one.
pub const FALLBACK_EMOJI: &str = "✨";
/// UI color when the archetype does not define one.
pub const FALLBACK_COLOR: &str = "#888888";

/// Most trait names mentioned in the short description.
const DESCRIPTION_TRAIT_LIMIT: usize = 3;

/// Complete personality context for a Daemon. Built fresh per call; never mutated.
#[derive(Debug, Clone)]
pub struct PersonalityContext {
    archetype: &'static ArchetypeDefinition,
    similarity: f64,
    top_traits: Vec<TraitKey>,
    description: String,
}

/// UI-ready personality data, consumed verbatim by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPayload {
    pub archetype_id: String,
    pub archetype_name: String,
    pub emoji: String,
    pub color: String,
    pub top_traits: Vec<TraitKey>,
    pub description: String,
}

impl PersonalityContext {
    pub fn archetype(&self) -> &'static ArchetypeDefinition {
        self.archetype
    }

    pub fn archetype_id(&self) -> &'static str {
        self.archetype.id
    }

    pub fn archetype_name(&self) -> &'static str {
        self.archetype.name
    }

    pub fn tone_profile(&self) -> &'static str {
        self.archetype.tone_profile
    }

    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    pub fn top_traits(&self) -> &[TraitKey] {
        &self.top_traits
    }

    /// Short description: `"Name (tone). Currently skewing a and b."`
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn ux_metadata(&self) -> BTreeMap<String, String> {
        self.archetype.ux_map()
    }

    /// The assignment this context was built from.
    pub fn assignment(&self) -> AssignmentResult {
        AssignmentResult {
            archetype_id: self.archetype.id,
            similarity: self.similarity,
        }
    }

    /// Personality section for model prompts.
    pub fn prompt_section(&self) -> String {
        let mut out = format!(
            "You are speaking as a {} archetype Daemon. Your tone should be: {}. ",
            self.archetype.name, self.archetype.tone_profile
        );
        if !self.top_traits.is_empty() {
            out.push_str(&format!(
                "Your current strongest traits are: {}. ",
                join_traits(&self.top_traits, ", ")
            ));
            out.push_str(
                "Let these traits subtly influence your response while maintaining your core archetype personality.",
            );
        }
        out
    }

    /// Structured payload for the presentation layer.
    pub fn ui_payload(&self) -> UiPayload {
        UiPayload {
            archetype_id: self.archetype.id.to_string(),
            archetype_name: self.archetype.name.to_string(),
            emoji: self
                .archetype
                .ux_hint(UX_EMOJI)
                .unwrap_or(FALLBACK_EMOJI)
                .to_string(),
            color: self
                .archetype
                .ux_hint(UX_COLOR)
                .unwrap_or(FALLBACK_COLOR)
                .to_string(),
            top_traits: self.top_traits.clone(),
            description: self.description.clone(),
        }
    }

    /// "balanced" when no trait stands out; otherwise the top trait names.
    pub fn top_traits_or_balanced(&self) -> String {
        if self.top_traits.is_empty() {
            "balanced".to_string()
        } else {
            join_traits(&self.top_traits, ", ")
        }
    }
}

/// Description combining the archetype with the currently dominant traits.
pub fn archetype_description(archetype: &ArchetypeDefinition, top_traits: &[TraitKey]) -> String {
    let base = format!("{} ({})", archetype.name, archetype.tone_profile);
    if top_traits.is_empty() {
        return format!("{}.", base);
    }
    let limit = top_traits.len().min(DESCRIPTION_TRAIT_LIMIT);
    let skew = join_traits(&top_traits[..limit], " and ").to_lowercase();
    format!("{}. Currently skewing {}.", base, skew)
}

fn join_traits(traits: &[TraitKey], sep: &str) -> String {
    traits
        .iter()
        .map(TraitKey::as_str)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Builds personality contexts with a fixed configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalityBuilder {
    config: PersonaConfig,
}

impl PersonalityBuilder {
    pub fn new(config: PersonaConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &PersonaConfig {
        &self.config
    }

    /// Assign an archetype (with hysteresis against `current_archetype_id`) and compose
    /// the description from it and the salient traits.
    pub fn build(
        &self,
        traits: &TraitVector,
        current_archetype_id: Option<&str>,
    ) -> PersonalityContext {
        let assignment = assign_archetype(
            traits,
            current_archetype_id,
            self.config.hysteresis_margin,
        );
        let top = top_traits(traits, self.config.trait_threshold, self.config.top_n);
        let archetype = archetype_or_default(Some(assignment.archetype_id));
        let description = archetype_description(archetype, &top);
        tracing::debug!(
            target: "daemon::persona",
            archetype = archetype.id,
            similarity = assignment.similarity,
            top_traits = ?top,
            "Personality context built"
        );
        PersonalityContext {
            archetype,
            similarity: assignment.similarity,
            top_traits: top,
            description,
        }
    }
}

/// Build a personality context with explicit salience settings and the default margin.
pub fn build_personality_context(
    traits: &TraitVector,
    current_archetype_id: Option<&str>,
    trait_threshold: u32,
    top_n: usize,
) -> PersonalityContext {
    PersonalityBuilder::new(PersonaConfig {
        trait_threshold,
        top_n,
        ..PersonaConfig::default()
    })
    .build(traits, current_archetype_id)
}
