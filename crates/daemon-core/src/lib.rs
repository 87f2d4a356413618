//! daemon-core: archetype assignment and personality context for Daemons.
//!
//! A Daemon accumulates a 20-dimensional trait vector as it is fed content. This crate maps
//! that vector onto one of eight archetypes (cosine similarity against hand-authored
//! centroids, with hysteresis so the assignment does not flicker) and renders the result
//! as prompt text and a UI payload. Everything on the assignment path is pure and total.
//!
//! ```text
//! TraitVector ─normalize─▶ TraitProfile ─cosine─▶ ranked archetypes ─hysteresis─▶ AssignmentResult
//!      │                                                                              │
//!      └────────────── top_traits ──────────────▶ PersonalityBuilder ◀────────────────┘
//!                                                     │
//!                                  description / prompt_section / ui_payload
//! ```

mod archetypes;
mod assignment;
mod config;
mod error;
mod personality;
mod similarity;
mod top_traits;
mod traits;
pub mod prompts;
pub mod validators;

pub use archetypes::{
    archetype_or_default, default_archetype, find_archetype,
    ArchetypeDefinition, ARCHETYPES, DEFAULT_ARCHETYPE_ID, UX_ANIMATION, UX_COLOR, UX_EMOJI,
};
pub use assignment::{
    assign_archetype, rank_archetypes, should_update_archetype, ArchetypeScore, AssignmentResult,
    DEFAULT_HYSTERESIS_MARGIN,
};
pub use config::{DaemonConfig, PersonaConfig, DEFAULT_TOP_TRAITS, DEFAULT_TRAIT_THRESHOLD};
pub use error::{PersonaError, PersonaResult};
pub use personality::{
    archetype_description, build_personality_context, PersonalityBuilder, PersonalityContext,
    UiPayload, FALLBACK_COLOR, FALLBACK_EMOJI,
};
pub use prompts::EvolutionStage;
pub use similarity::{cosine_similarity, normalize_traits};
pub use top_traits::top_traits;
pub use traits::{TraitDelta, TraitKey, TraitProfile, TraitVector, MAX_TRAIT_DELTA, TRAIT_COUNT};
