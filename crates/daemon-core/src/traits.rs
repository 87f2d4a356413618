//! Trait space: the 20 closed personality dimensions and the accumulated trait vector.
//!
//! `TraitVector` holds raw, lifetime-accumulated intensities (non-negative integers).
//! `TraitProfile` is the dense floating-point form used for centroids and normalized vectors.
//! Iteration always follows the canonical declaration order of `TraitKey`.

use crate::error::{PersonaError, PersonaResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Index;

/// Number of trait dimensions.
pub const TRAIT_COUNT: usize = 20;

/// Largest per-feed delta a single trait may receive.
pub const MAX_TRAIT_DELTA: u8 = 3;

// -----------------------------------------------------------------------------
// TraitKey
// -----------------------------------------------------------------------------

/// One of the 20 fixed personality dimensions. Serialized by its PascalCase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraitKey {
    Intelligence,
    Creativity,
    Empathy,
    Resilience,
    Curiosity,
    Humor,
    Kindness,
    Confidence,
    Discipline,
    Honesty,
    Patience,
    Optimism,
    Courage,
    OpenMindedness,
    Prudence,
    Adaptability,
    Gratitude,
    Ambition,
    Humility,
    Playfulness,
}

impl TraitKey {
    /// All 20 traits in canonical order.
    pub const ALL: [TraitKey; TRAIT_COUNT] = [
        Self::Intelligence,
        Self::Creativity,
        Self::Empathy,
        Self::Resilience,
        Self::Curiosity,
        Self::Humor,
        Self::Kindness,
        Self::Confidence,
        Self::Discipline,
        Self::Honesty,
        Self::Patience,
        Self::Optimism,
        Self::Courage,
        Self::OpenMindedness,
        Self::Prudence,
        Self::Adaptability,
        Self::Gratitude,
        Self::Ambition,
        Self::Humility,
        Self::Playfulness,
    ];

    /// Position in the canonical order (index into a `TraitProfile`).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intelligence => "Intelligence",
            Self::Creativity => "Creativity",
            Self::Empathy => "Empathy",
            Self::Resilience => "Resilience",
            Self::Curiosity => "Curiosity",
            Self::Humor => "Humor",
            Self::Kindness => "Kindness",
            Self::Confidence => "Confidence",
            Self::Discipline => "Discipline",
            Self::Honesty => "Honesty",
            Self::Patience => "Patience",
            Self::Optimism => "Optimism",
            Self::Courage => "Courage",
            Self::OpenMindedness => "OpenMindedness",
            Self::Prudence => "Prudence",
            Self::Adaptability => "Adaptability",
            Self::Gratitude => "Gratitude",
            Self::Ambition => "Ambition",
            Self::Humility => "Humility",
            Self::Playfulness => "Playfulness",
        }
    }

    /// Exact-name lookup (`"OpenMindedness"`). Returns None for anything outside the 20 keys.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Case-insensitive lookup for sanitizing model output (`"openmindedness"`).
    pub fn parse_loose(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for TraitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// TraitProfile: dense normalized form
// -----------------------------------------------------------------------------

/// Dense 20-value profile in canonical order. Centroids and normalized vectors use this form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TraitProfile(pub [f64; TRAIT_COUNT]);

impl TraitProfile {
    pub const ZERO: TraitProfile = TraitProfile([0.0; TRAIT_COUNT]);

    pub fn get(&self, key: TraitKey) -> f64 {
        self.0[key.index()]
    }

    pub fn values(&self) -> &[f64; TRAIT_COUNT] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// (key, value) pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (TraitKey, f64)> + '_ {
        TraitKey::ALL.iter().map(move |k| (*k, self.0[k.index()]))
    }
}

impl Index<TraitKey> for TraitProfile {
    type Output = f64;

    fn index(&self, key: TraitKey) -> &f64 {
        &self.0[key.index()]
    }
}

// -----------------------------------------------------------------------------
// TraitDelta
// -----------------------------------------------------------------------------

/// Per-feed increment for one trait; `delta` is always within [0, 3].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitDelta {
    #[serde(rename = "trait")]
    pub trait_key: TraitKey,
    pub delta: u8,
}

impl TraitDelta {
    /// Builds a delta, clamping any value above `MAX_TRAIT_DELTA`.
    pub fn new(trait_key: TraitKey, delta: u8) -> Self {
        Self {
            trait_key,
            delta: delta.min(MAX_TRAIT_DELTA),
        }
    }

    /// One zero delta per trait, in canonical order.
    pub fn zeroed() -> Vec<TraitDelta> {
        TraitKey::ALL.iter().map(|k| TraitDelta::new(*k, 0)).collect()
    }
}

// -----------------------------------------------------------------------------
// TraitVector: raw accumulated counts
// -----------------------------------------------------------------------------

/// Accumulated trait intensities. Absent keys read as zero; values are unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitVector {
    values: BTreeMap<TraitKey, u32>,
}

impl TraitVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value for `key` (0 when absent).
    pub fn get(&self, key: TraitKey) -> u32 {
        self.values.get(&key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: TraitKey, value: u32) {
        self.values.insert(key, value);
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: TraitKey, value: u32) -> Self {
        self.set(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Present entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (TraitKey, u32)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Largest present value, or None for an empty vector.
    pub fn max_value(&self) -> Option<u32> {
        self.values.values().copied().max()
    }

    /// Strict boundary constructor: rejects unknown trait names and negative values.
    pub fn try_from_raw<'a, I>(raw: I) -> PersonaResult<Self>
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut out = Self::new();
        for (name, value) in raw {
            let key =
                TraitKey::parse(name).ok_or_else(|| PersonaError::UnknownTrait(name.to_string()))?;
            if value < 0 {
                return Err(PersonaError::NegativeTraitValue {
                    trait_name: name.to_string(),
                    value,
                });
            }
            out.set(key, u32::try_from(value).unwrap_or(u32::MAX));
        }
        Ok(out)
    }

    /// Lenient boundary constructor: drops unknown names and clamps negatives to zero.
    pub fn from_raw_lossy<'a, I>(raw: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut out = Self::new();
        for (name, value) in raw {
            let Some(key) = TraitKey::parse(name) else {
                tracing::warn!(target: "daemon::traits", trait_name = name, "Dropping unknown trait key");
                continue;
            };
            if value < 0 {
                tracing::warn!(target: "daemon::traits", trait_name = name, value, "Clamping negative trait value to 0");
            }
            out.set(key, u32::try_from(value.max(0)).unwrap_or(u32::MAX));
        }
        out
    }

    /// Projected vector after adding each delta (deltas are already clamped to [0, 3]).
    pub fn apply_deltas(&self, deltas: &[TraitDelta]) -> Self {
        let mut out = self.clone();
        for d in deltas {
            let current = out.get(d.trait_key);
            out.set(
                d.trait_key,
                current.saturating_add(u32::from(d.delta.min(MAX_TRAIT_DELTA))),
            );
        }
        out
    }

    /// Highest-valued trait. Ties go to the lexically greatest trait name. None when empty.
    pub fn dominant_trait(&self) -> Option<TraitKey> {
        self.values
            .iter()
            .max_by(|(ka, va), (kb, vb)| va.cmp(vb).then_with(|| ka.as_str().cmp(kb.as_str())))
            .map(|(k, _)| *k)
    }
}

impl FromIterator<(TraitKey, u32)> for TraitVector {
    fn from_iter<T: IntoIterator<Item = (TraitKey, u32)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keys_roundtrip_names() {
        for (i, k) in TraitKey::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
            assert_eq!(TraitKey::parse(k.as_str()), Some(*k));
        }
        assert_eq!(TraitKey::parse("openmindedness"), None);
        assert_eq!(TraitKey::parse_loose(" openmindedness "), Some(TraitKey::OpenMindedness));
    }

    #[test]
    fn test_vector_serializes_as_name_map() {
        let v = TraitVector::new()
            .with(TraitKey::Humor, 9)
            .with(TraitKey::OpenMindedness, 2);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, serde_json::json!({"Humor": 9, "OpenMindedness": 2}));
        let back: TraitVector = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_unknown_trait_fails_deserialization() {
        let res: Result<TraitVector, _> = serde_json::from_value(serde_json::json!({"Luck": 3}));
        assert!(res.is_err());
    }

    #[test]
    fn test_try_from_raw_rejects_bad_input() {
        let err = TraitVector::try_from_raw([("Luck", 1)]).unwrap_err();
        assert!(matches!(err, PersonaError::UnknownTrait(ref n) if n == "Luck"));

        let err = TraitVector::try_from_raw([("Humor", -2)]).unwrap_err();
        assert!(matches!(err, PersonaError::NegativeTraitValue { value: -2, .. }));

        let ok = TraitVector::try_from_raw([("Humor", 4), ("Courage", 0)]).unwrap();
        assert_eq!(ok.get(TraitKey::Humor), 4);
        assert_eq!(ok.len(), 2);
    }

    #[test]
    fn test_from_raw_lossy_clamps_and_drops() {
        let v = TraitVector::from_raw_lossy([("Humor", -5), ("Luck", 7), ("Empathy", 3)]);
        assert_eq!(v.get(TraitKey::Humor), 0);
        assert_eq!(v.get(TraitKey::Empathy), 3);
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_apply_deltas_accumulates() {
        let v = TraitVector::new().with(TraitKey::Humor, 5);
        let deltas = [
            TraitDelta::new(TraitKey::Humor, 2),
            TraitDelta::new(TraitKey::Courage, 9),
        ];
        let out = v.apply_deltas(&deltas);
        assert_eq!(out.get(TraitKey::Humor), 7);
        assert_eq!(out.get(TraitKey::Courage), 3);
        // input untouched
        assert_eq!(v.get(TraitKey::Humor), 5);
    }

    #[test]
    fn test_dominant_trait_tie_breaks_on_name() {
        let v = TraitVector::new()
            .with(TraitKey::Humor, 5)
            .with(TraitKey::Courage, 5)
            .with(TraitKey::Empathy, 1);
        assert_eq!(v.dominant_trait(), Some(TraitKey::Humor));
        assert_eq!(TraitVector::new().dominant_trait(), None);
    }

    #[test]
    fn test_zeroed_deltas_cover_all_traits() {
        let z = TraitDelta::zeroed();
        assert_eq!(z.len(), TRAIT_COUNT);
        assert!(z.iter().all(|d| d.delta == 0));
    }
}
