//! Content analysis: content + current traits → trait deltas, roast, new archetype.
//!
//! The model path builds a personality-aware prompt, sanitizes whatever comes back, and
//! projects the deltas onto the current traits. Any provider failure (or mock mode) drops
//! to the deterministic mock path, so callers never see a provider error.

use crate::error::FeedResult;
use crate::schemas::{AnalyzeRequest, AnalyzeResponse, NameSuggestion};
use daemon_core::prompts::build_analysis_prompt;
use daemon_core::validators::{sanitize_llm_response, ROAST_MAX_CHARS};
use daemon_core::{DaemonConfig, PersonalityBuilder, TraitDelta, TraitKey, TraitVector};
use daemon_llm::{GenerateOptions, LlmProvider, ProviderRegistry};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Text longer than this (in chars) is tagged "long".
const LONG_TEXT_CHARS: usize = 80;
const CAPTION_TEXT_CHARS: usize = 64;
/// Number of strongest current traits bumped by the mock analysis.
const MOCK_BOOSTED_TRAITS: usize = 4;
/// Roast used when the model reply omits one.
const MISSING_ROAST: &str = "Interesting content!";

#[derive(Clone)]
pub struct AnalysisService {
    provider: Option<Arc<dyn LlmProvider>>,
    builder: PersonalityBuilder,
    mock_mode: bool,
    options: GenerateOptions,
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("builder", &self.builder)
            .field("mock_mode", &self.mock_mode)
            .finish()
    }
}

impl AnalysisService {
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        builder: PersonalityBuilder,
        mock_mode: bool,
    ) -> Self {
        Self {
            provider,
            builder,
            mock_mode,
            options: GenerateOptions::json(),
        }
    }

    /// Mock-only service: no provider is ever called.
    pub fn mock(builder: PersonalityBuilder) -> Self {
        Self::new(None, builder, true)
    }

    /// Select a provider from `registry` per the configured preference and fallback.
    pub fn from_config(config: &DaemonConfig, registry: &ProviderRegistry) -> Self {
        let provider = if config.mock_mode {
            None
        } else {
            registry.select(&config.llm_provider, config.llm_fallback_enabled)
        };
        if provider.is_none() && !config.mock_mode {
            tracing::warn!(target: "daemon::analysis", "No LLM provider available - will use mock analysis");
        }
        Self::new(provider, PersonalityBuilder::new(config.persona), config.mock_mode)
    }

    pub fn builder(&self) -> &PersonalityBuilder {
        &self.builder
    }

    /// True when requests go to a model rather than the mock path.
    pub fn uses_llm(&self) -> bool {
        !self.mock_mode && self.provider.is_some()
    }

    /// Analyze one piece of content. Errors only on invalid input traits.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> FeedResult<AnalyzeResponse> {
        let traits = request.current_traits.to_vector()?;
        let current = request.current_archetype_id.as_deref();

        if let Some(provider) = self.provider.as_ref().filter(|_| !self.mock_mode) {
            match self.analyze_with_provider(&**provider, request, &traits).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::error!(target: "daemon::analysis", provider = provider.name(), error = %e, "LLM analysis failed");
                    tracing::info!(target: "daemon::analysis", "Falling back to mock response");
                }
            }
        }

        Ok(self.analyze_mock(request, &traits, current))
    }

    async fn analyze_with_provider(
        &self,
        provider: &dyn LlmProvider,
        request: &AnalyzeRequest,
        traits: &TraitVector,
    ) -> FeedResult<AnalyzeResponse> {
        let current = request.current_archetype_id.as_deref();
        let prompt = build_analysis_prompt(
            request.text(),
            request.file_description(),
            traits,
            current,
            &self.builder,
        );

        tracing::info!(target: "daemon::analysis", provider = provider.name(), "Calling LLM provider for analysis");
        let response = provider.generate(&prompt, &self.options).await?;
        let parsed = response.parse_json()?;

        let empty = Map::new();
        let deltas = parsed
            .get("traitDeltas")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let roast = parsed
            .get("roast")
            .and_then(Value::as_str)
            .unwrap_or(MISSING_ROAST);
        let clean = sanitize_llm_response(roast, deltas, None, &[]);

        let out = self.respond(request, traits, current, clean.roast, clean.deltas);
        tracing::info!(
            target: "daemon::analysis",
            provider = response.provider,
            archetype = out.new_archetype_id.as_deref().unwrap_or_default(),
            "LLM analysis successful"
        );
        Ok(out)
    }

    fn analyze_mock(
        &self,
        request: &AnalyzeRequest,
        traits: &TraitVector,
        current: Option<&str>,
    ) -> AnalyzeResponse {
        let personality = self.builder.build(traits, current);
        let focus = personality
            .top_traits()
            .first()
            .map(TraitKey::as_str)
            .unwrap_or("mystery");
        let roast: String = format!(
            "{} says: Your vibe screams {} — try harder.",
            personality.archetype_name(),
            focus
        )
        .chars()
        .take(ROAST_MAX_CHARS)
        .collect();

        self.respond(request, traits, current, roast, mock_deltas(traits))
    }

    /// Shared tail of both paths: project deltas, reassign with hysteresis, shape the response.
    fn respond(
        &self,
        request: &AnalyzeRequest,
        traits: &TraitVector,
        current: Option<&str>,
        roast: String,
        deltas: Vec<TraitDelta>,
    ) -> AnalyzeResponse {
        let projected = traits.apply_deltas(&deltas);
        let personality = self.builder.build(&projected, current);
        AnalyzeResponse {
            caption: caption(request),
            tags: content_tags(request),
            roast: Some(roast),
            trait_deltas: deltas,
            new_archetype_id: Some(personality.archetype_id().to_string()),
            top_traits: personality.top_traits().to_vec(),
        }
    }
}

/// +1 for the strongest present traits (ties keep canonical order); 0 for the rest.
pub fn mock_deltas(traits: &TraitVector) -> Vec<TraitDelta> {
    let mut ranked: Vec<(TraitKey, u32)> = traits.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let boosted: Vec<TraitKey> = ranked
        .into_iter()
        .take(MOCK_BOOSTED_TRAITS)
        .map(|(k, _)| k)
        .collect();

    TraitKey::ALL
        .iter()
        .map(|k| TraitDelta::new(*k, u8::from(boosted.contains(k))))
        .collect()
}

/// `text` + `long`/`short` for text content, `image` when an image is attached.
pub fn content_tags(request: &AnalyzeRequest) -> Vec<String> {
    let mut tags = Vec::new();
    if let Some(text) = request.text() {
        tags.push("text".to_string());
        let length = if text.chars().count() > LONG_TEXT_CHARS { "long" } else { "short" };
        tags.push(length.to_string());
    }
    if request.has_image() {
        tags.push("image".to_string());
    }
    tags
}

/// File description if given, else the first 64 chars of the text.
pub fn caption(request: &AnalyzeRequest) -> Option<String> {
    request
        .file_description()
        .map(str::to_string)
        .or_else(|| request.text().map(|t| t.chars().take(CAPTION_TEXT_CHARS).collect()))
}

/// Placeholder name: first letter of the dominant trait + "oggo".
pub fn mock_name(traits: &TraitVector) -> NameSuggestion {
    let dominant = traits.dominant_trait().map(|k| k.as_str()).unwrap_or("N");
    let initial: String = dominant.chars().take(1).flat_map(char::to_lowercase).collect();
    NameSuggestion {
        name: format!("{}oggo", initial),
        rationale: Some(format!("Inspired by {}", dominant)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: Option<&str>, desc: Option<&str>) -> AnalyzeRequest {
        AnalyzeRequest {
            text: text.map(str::to_string),
            file_description: desc.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_tags() {
        assert_eq!(content_tags(&request(Some("hi"), None)), vec!["text", "short"]);
        let long = "y".repeat(81);
        assert_eq!(content_tags(&request(Some(&long), None)), vec!["text", "long"]);
        assert_eq!(content_tags(&request(Some(&"y".repeat(80)), None)), vec!["text", "short"]);
        let mut img = request(Some(""), None);
        img.image_url = Some("https://x/cat.png".into());
        assert_eq!(content_tags(&img), vec!["image"]);
        assert!(content_tags(&request(None, None)).is_empty());
    }

    #[test]
    fn test_caption() {
        assert_eq!(caption(&request(Some("text"), Some("a cat"))).as_deref(), Some("a cat"));
        let long = "z".repeat(100);
        assert_eq!(caption(&request(Some(&long), Some(""))), Some("z".repeat(64)));
        assert_eq!(caption(&request(None, None)), None);
    }

    #[test]
    fn test_mock_deltas_bump_top_four() {
        let traits = TraitVector::new()
            .with(TraitKey::Humor, 9)
            .with(TraitKey::Kindness, 7)
            .with(TraitKey::Courage, 7)
            .with(TraitKey::Prudence, 2)
            .with(TraitKey::Gratitude, 1);
        let deltas = mock_deltas(&traits);
        assert_eq!(deltas.len(), 20);
        let bumped: Vec<TraitKey> = deltas.iter().filter(|d| d.delta == 1).map(|d| d.trait_key).collect();
        assert_eq!(
            bumped,
            vec![TraitKey::Humor, TraitKey::Kindness, TraitKey::Courage, TraitKey::Prudence]
        );
        assert!(mock_deltas(&TraitVector::new()).iter().all(|d| d.delta == 0));
    }

    #[test]
    fn test_mock_name() {
        let traits = TraitVector::new().with(TraitKey::Humor, 5).with(TraitKey::Courage, 2);
        let n = mock_name(&traits);
        assert_eq!(n.name, "hoggo");
        assert_eq!(n.rationale.as_deref(), Some("Inspired by Humor"));
        assert_eq!(mock_name(&TraitVector::new()).name, "noggo");
    }

    #[test]
    fn test_from_config_in_mock_mode_skips_registry() {
        let cfg = DaemonConfig::default();
        let svc = AnalysisService::from_config(&cfg, &ProviderRegistry::new());
        assert!(!svc.uses_llm());
    }
}
