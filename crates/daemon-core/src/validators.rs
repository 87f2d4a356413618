//! Sanitization of model output before it touches trait state.
//!
//! Every check degrades gracefully: invalid values are clamped, dropped, or replaced with
//! a fallback, and the correction is logged. Nothing here returns an error.

use crate::archetypes::find_archetype;
use crate::traits::{TraitDelta, TraitKey, MAX_TRAIT_DELTA};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

pub const ROAST_MAX_CHARS: usize = 140;
pub const ROAST_MAX_WORDS: usize = 25;
pub const TOP_TRAITS_MAX: usize = 3;

pub const EMPTY_ROAST_FALLBACK: &str = "Interesting submission!";
pub const FORBIDDEN_ROAST_FALLBACK: &str = "Your content is... unique!";
pub const PROVIDER_FAILURE_ROAST: &str = "I'm processing this... give me a moment to think!";

static FORBIDDEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(password|token|api[_-]?key|secret|credential)\b",
        r"(?i)\b(hack|exploit|vulnerability)\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Model output after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedResponse {
    pub roast: String,
    /// One delta per trait, canonical order.
    pub deltas: Vec<TraitDelta>,
    pub archetype_id: Option<&'static str>,
    pub top_traits: Vec<TraitKey>,
}

/// Enforce non-empty, safe, and short roast text.
pub fn validate_roast(roast: &str, max_chars: usize, max_words: usize) -> String {
    let roast = roast.trim();
    if roast.is_empty() {
        tracing::warn!(target: "daemon::validators", "Empty roast received, using fallback");
        return EMPTY_ROAST_FALLBACK.to_string();
    }

    if let Some(pattern) = FORBIDDEN_PATTERNS.iter().find(|re| re.is_match(roast)) {
        tracing::warn!(target: "daemon::validators", pattern = pattern.as_str(), "Roast contains forbidden content");
        return FORBIDDEN_ROAST_FALLBACK.to_string();
    }

    let mut out = roast.to_string();
    let words: Vec<&str> = out.split_whitespace().collect();
    if words.len() > max_words {
        tracing::info!(target: "daemon::validators", words = words.len(), "Roast too long, truncating");
        out = format!("{}...", words[..max_words].join(" "));
    }

    let chars = out.chars().count();
    if chars > max_chars {
        tracing::info!(target: "daemon::validators", chars, "Roast exceeds char limit, truncating");
        let keep = max_chars.saturating_sub(3);
        out = format!("{}...", out.chars().take(keep).collect::<String>());
    }
    out
}

/// Read a `{Trait: delta}` object into one clamped delta per trait.
///
/// Missing traits get 0; non-numeric values get 0; numbers are truncated and clamped to [0, 3].
pub fn validate_trait_deltas(raw: &Map<String, Value>) -> Vec<TraitDelta> {
    TraitKey::ALL
        .iter()
        .map(|key| {
            let delta = match raw.get(key.as_str()) {
                None | Some(Value::Null) => 0,
                Some(Value::Number(n)) => {
                    let v = n.as_f64().unwrap_or(0.0);
                    v.trunc().clamp(0.0, f64::from(MAX_TRAIT_DELTA)) as u8
                }
                Some(other) => {
                    tracing::warn!(target: "daemon::validators", trait_name = key.as_str(), value = %other, "Invalid delta type");
                    0
                }
            };
            TraitDelta::new(*key, delta)
        })
        .collect()
}

/// Normalize an archetype id (trim + lowercase) and keep it only if it is in the catalog.
pub fn validate_archetype_id(archetype_id: Option<&str>) -> Option<&'static str> {
    let raw = archetype_id?.trim();
    if raw.is_empty() {
        return None;
    }
    let id = raw.to_lowercase();
    match find_archetype(&id) {
        Some(a) => Some(a.id),
        None => {
            tracing::warn!(target: "daemon::validators", archetype_id = %id, "Invalid archetype ID");
            None
        }
    }
}

/// Keep at most `max_traits` entries (from the front) that name real traits.
/// Names are matched case-insensitively since they come from model output.
pub fn validate_top_traits(top_traits: &[String], max_traits: usize) -> Vec<TraitKey> {
    top_traits
        .iter()
        .take(max_traits)
        .filter_map(|name| {
            let key = TraitKey::parse_loose(name);
            if key.is_none() {
                tracing::warn!(target: "daemon::validators", trait_name = %name, "Invalid trait in top traits");
            }
            key
        })
        .collect()
}

/// Validate a complete model response.
pub fn sanitize_llm_response(
    roast: &str,
    trait_deltas: &Map<String, Value>,
    archetype_id: Option<&str>,
    top_traits: &[String],
) -> SanitizedResponse {
    SanitizedResponse {
        roast: validate_roast(roast, ROAST_MAX_CHARS, ROAST_MAX_WORDS),
        deltas: validate_trait_deltas(trait_deltas),
        archetype_id: validate_archetype_id(archetype_id),
        top_traits: validate_top_traits(top_traits, TOP_TRAITS_MAX),
    }
}

/// Response used when the model fails completely: placeholder roast and zero deltas.
pub fn fallback_response() -> (String, Vec<TraitDelta>) {
    (PROVIDER_FAILURE_ROAST.to_string(), TraitDelta::zeroed())
}
