//! Wire shapes for the analysis API (camelCase JSON).

use daemon_core::{PersonaResult, TraitDelta, TraitKey, TraitVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trait state as sent by clients: raw accumulated values plus the displayed subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    #[serde(default)]
    pub values: BTreeMap<String, i64>,
    #[serde(default)]
    pub active: Vec<TraitKey>,
}

impl PersonalityTraits {
    /// Strict conversion: unknown trait names and negative values are rejected.
    pub fn to_vector(&self) -> PersonaResult<TraitVector> {
        TraitVector::try_from_raw(self.values.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    pub fn from_vector(traits: &TraitVector) -> Self {
        Self {
            values: traits
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), i64::from(v)))
                .collect(),
            active: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    /// Mime type or extension.
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_description: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub current_traits: PersonalityTraits,
    #[serde(default)]
    pub dominant_trait: Option<TraitKey>,
    #[serde(default)]
    pub current_archetype_id: Option<String>,
}

impl AnalyzeRequest {
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    pub fn file_description(&self) -> Option<&str> {
        self.file_description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn has_image(&self) -> bool {
        [&self.image_url, &self.image_base64]
            .iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub caption: Option<String>,
    pub tags: Vec<String>,
    pub roast: Option<String>,
    /// One entry per trait, canonical order.
    pub trait_deltas: Vec<TraitDelta>,
    pub new_archetype_id: Option<String>,
    pub top_traits: Vec<TraitKey>,
}

impl AnalyzeResponse {
    /// Deltas as a full 20-key record (missing traits read 0).
    pub fn delta_record(&self) -> BTreeMap<TraitKey, u8> {
        let mut out: BTreeMap<TraitKey, u8> = TraitKey::ALL.iter().map(|k| (*k, 0)).collect();
        for d in &self.trait_deltas {
            out.insert(d.trait_key, d.delta);
        }
        out
    }
}

/// Suggested pet name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSuggestion {
    pub name: String,
    pub rationale: Option<String>,
}
