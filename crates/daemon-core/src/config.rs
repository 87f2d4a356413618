//! Daemon configuration: persona tuning and process-level settings.
//!
//! Persona defaults are compile-time constants; they may be overridden at start-up from
//! the environment or from `config/daemon.toml`. Nothing here changes after start-up.

use crate::assignment::DEFAULT_HYSTERESIS_MARGIN;
use crate::error::PersonaResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Minimum raw value for a trait to count as salient.
pub const DEFAULT_TRAIT_THRESHOLD: u32 = 10;
/// Number of salient traits surfaced in descriptions.
pub const DEFAULT_TOP_TRAITS: usize = 3;

fn default_margin() -> f64 {
    DEFAULT_HYSTERESIS_MARGIN
}

fn default_threshold() -> u32 {
    DEFAULT_TRAIT_THRESHOLD
}

fn default_top_n() -> usize {
    DEFAULT_TOP_TRAITS
}

fn default_true() -> bool {
    true
}

fn default_llm_provider() -> String {
    "gemini".to_string()
}

/// Tuning for archetype assignment and trait salience.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | DAEMON_HYSTERESIS_MARGIN | 0.15 | Similarity gain required to switch archetype (clamped to 0–1). |
/// | DAEMON_TRAIT_THRESHOLD | 10 | Minimum raw value for a top trait. |
/// | DAEMON_TOP_TRAITS | 3 | Number of top traits to surface. |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_margin")]
    pub hysteresis_margin: f64,
    #[serde(default = "default_threshold")]
    pub trait_threshold: u32,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            hysteresis_margin: DEFAULT_HYSTERESIS_MARGIN,
            trait_threshold: DEFAULT_TRAIT_THRESHOLD,
            top_n: DEFAULT_TOP_TRAITS,
        }
    }
}

impl PersonaConfig {
    /// Load from environment. Unset or invalid => defaults.
    pub fn from_env() -> Self {
        Self {
            hysteresis_margin: env_margin(),
            trait_threshold: env_parse("DAEMON_TRAIT_THRESHOLD", DEFAULT_TRAIT_THRESHOLD),
            top_n: env_parse("DAEMON_TOP_TRAITS", DEFAULT_TOP_TRAITS),
        }
    }

    /// Margin clamped into [0, 1]; NaN falls back to the default.
    pub fn sanitized(mut self) -> Self {
        self.hysteresis_margin = if self.hysteresis_margin.is_nan() {
            DEFAULT_HYSTERESIS_MARGIN
        } else {
            self.hysteresis_margin.clamp(0.0, 1.0)
        };
        self
    }
}

fn env_margin() -> f64 {
    match std::env::var("DAEMON_HYSTERESIS_MARGIN") {
        Ok(v) => v
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|m| !m.is_nan())
            .unwrap_or(DEFAULT_HYSTERESIS_MARGIN)
            .clamp(0.0, 1.0),
        Err(_) => DEFAULT_HYSTERESIS_MARGIN,
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Process configuration. Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub persona: PersonaConfig,
    /// Preferred text-generation backend ("gemini", "claude", "openai").
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String,
    /// Try the remaining backends when the preferred one is unavailable.
    #[serde(default = "default_true")]
    pub llm_fallback_enabled: bool,
    /// Skip the model entirely and use deterministic mock analysis.
    #[serde(default = "default_true")]
    pub mock_mode: bool,
    /// HMAC secret for inbound webhook signatures. Unset => signatures are not checked.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            persona: PersonaConfig::default(),
            llm_provider: default_llm_provider(),
            llm_fallback_enabled: true,
            mock_mode: true,
            webhook_secret: None,
        }
    }
}

impl DaemonConfig {
    /// Load config from file and environment. Precedence: env `DAEMON_CONFIG` path > `config/daemon.toml` > defaults.
    pub fn load() -> PersonaResult<Self> {
        let config_path =
            std::env::var("DAEMON_CONFIG").unwrap_or_else(|_| "config/daemon.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load from an explicit file (skipped if missing), then overlay `DAEMON_*` env vars
    /// (`DAEMON_MOCK_MODE`, `DAEMON_PERSONA__TOP_N`, ...).
    pub fn load_from(path: &Path) -> PersonaResult<Self> {
        let builder = config::Config::builder()
            .set_default("persona.hysteresis_margin", DEFAULT_HYSTERESIS_MARGIN)?
            .set_default("persona.trait_threshold", i64::from(DEFAULT_TRAIT_THRESHOLD))?
            .set_default("persona.top_n", DEFAULT_TOP_TRAITS as i64)?
            .set_default("llm_provider", default_llm_provider())?
            .set_default("llm_fallback_enabled", true)?
            .set_default("mock_mode", true)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix("DAEMON")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: DaemonConfig = built.try_deserialize()?;
        cfg.persona = cfg.persona.sanitized();
        cfg.llm_provider = cfg.llm_provider.trim().to_lowercase();
        cfg.webhook_secret = cfg.webhook_secret.filter(|s| !s.trim().is_empty());
        tracing::debug!(target: "daemon::config", path = %path.display(), provider = %cfg.llm_provider, mock = cfg.mock_mode, "Configuration loaded");
        Ok(cfg)
    }
}
