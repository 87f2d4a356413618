//! Prompt templates that embed the personality context.

use crate::personality::PersonalityBuilder;
use crate::traits::{TraitKey, TraitVector};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// Content longer than this is cut (plus "...") before it goes into a prompt.
pub const CONTENT_PREVIEW_CHARS: usize = 500;

/// Growth stage of a Daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvolutionStage {
    #[default]
    Egg,
    Baby,
    Teen,
    Adult,
}

impl EvolutionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Egg => "Egg",
            Self::Baby => "Baby",
            Self::Teen => "Teen",
            Self::Adult => "Adult",
        }
    }

    /// Next stage; Adult is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::Egg => Self::Baby,
            Self::Baby => Self::Teen,
            Self::Teen | Self::Adult => Self::Adult,
        }
    }
}

/// Unknown stage names map to Adult, so parsing never fails.
impl FromStr for EvolutionStage {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Egg" => Self::Egg,
            "Baby" => Self::Baby,
            "Teen" => Self::Teen,
            _ => Self::Adult,
        })
    }
}

fn content_preview(content: &str) -> String {
    if content.chars().count() > CONTENT_PREVIEW_CHARS {
        let head: String = content.chars().take(CONTENT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

fn all_trait_names(sep: &str) -> String {
    TraitKey::ALL
        .iter()
        .map(TraitKey::as_str)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Analysis prompt: score all 20 traits (0–3) for the content and roast it in character.
pub fn build_analysis_prompt(
    text: Option<&str>,
    file_description: Option<&str>,
    traits: &TraitVector,
    current_archetype_id: Option<&str>,
    builder: &PersonalityBuilder,
) -> String {
    let personality = builder.build(traits, current_archetype_id);
    let content = text
        .filter(|t| !t.is_empty())
        .or(file_description.filter(|d| !d.is_empty()))
        .unwrap_or("N/A");

    let delta_schema = TraitKey::ALL
        .iter()
        .map(|k| format!("    \"{}\": 0-3", k.as_str()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"You are a Daemon personality analyzer for a Tamagotchi-style pet game.

{section}

Your task is to analyze the following content and respond with TWO things:

1. **Objective Trait Analysis**: Score each of the 20 personality traits based on the content's characteristics.
   - Each trait should receive a delta score between 0 and 3
   - 0 = not present, 1 = slightly present, 2 = moderately present, 3 = strongly present
   - Be objective and content-driven in your scoring

2. **Personality-Driven Roast**: Generate a short, punchy reaction to the content IN CHARACTER as this Daemon.
   - Must reflect your archetype personality ({name}: {tone})
   - Should be influenced by your top traits: {top}
   - Keep it to ~25 words or less, maximum 140 characters
   - Be playful, witty, and memorable
   - Make the roast UNIQUE to your personality - a different Daemon would react differently!

**Content to analyze:**
{content}

**The 20 traits to score:**
{traits}

**Response format (MUST be valid JSON):**
{{
  "traitDeltas": {{
{schema}
  }},
  "roast": "Your witty, personality-driven response here (≤140 chars)"
}}

Remember: The roast should sound like YOU, not a generic response!"#,
        section = personality.prompt_section(),
        name = personality.archetype_name(),
        tone = personality.tone_profile(),
        top = personality.top_traits_or_balanced(),
        content = content_preview(content),
        traits = all_trait_names(", "),
        schema = delta_schema,
    )
}

/// Sprite evolution prompt for the given target stage.
pub fn build_evolution_prompt(
    stage: EvolutionStage,
    traits: &TraitVector,
    current_archetype_id: Option<&str>,
    builder: &PersonalityBuilder,
) -> String {
    let personality = builder.build(traits, current_archetype_id);
    format!(
        "Evolve sprite for stage '{}'. Emphasize personality cues for {} archetype ({}). \
         Top traits: {}. Return concise style tags and a short rationale.",
        stage.as_str(),
        personality.archetype_name(),
        personality.tone_profile(),
        personality.top_traits_or_balanced(),
    )
}

/// Pet name generation prompt.
pub fn build_name_prompt(
    traits: &TraitVector,
    current_archetype_id: Option<&str>,
    builder: &PersonalityBuilder,
) -> String {
    let personality = builder.build(traits, current_archetype_id);
    format!(
        "Generate a short, unique pet name for a {} archetype Daemon. \
         The name should subtly reflect their personality: {}. \
         Avoid real human names. Be creative!",
        personality.archetype_name(),
        personality.tone_profile(),
    )
}
