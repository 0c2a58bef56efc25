//! Configuration loading and management.
//!
//! Loads Bedside configuration from `./bedside.toml` (or `$BEDSIDE_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

// ── Top-level config ────────────────────────────────────────────

/// Top-level Bedside configuration loaded from TOML.
///
/// Path: `./bedside.toml` or `$BEDSIDE_CONFIG_PATH`.
/// Env vars override file values; file values override defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BedsideConfig {
    /// Ollama endpoint and model (`[ollama]`).
    pub ollama: OllamaConfig,
    /// Sampling options sent with every completion (`[generation]`).
    pub generation: GenerationConfig,
    /// Speech-synthesis service (`[speech]`).
    pub speech: SpeechConfig,
    /// Persona harvesting from the training corpus (`[personas]`).
    pub personas: PersonasConfig,
    /// Conversation retention and prompt window (`[session]`).
    pub session: SessionConfig,
    /// Filesystem paths (`[paths]`).
    pub paths: PathsConfig,
}

impl BedsideConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$BEDSIDE_CONFIG_PATH` or `./bedside.toml`.
    /// If the file does not exist, returns defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_from_file() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: BedsideConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(BedsideConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(p) = env("BEDSIDE_CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("bedside.toml")
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("BEDSIDE_OLLAMA_URL") {
            self.ollama.base_url = v;
        }
        if let Some(v) = env("BEDSIDE_MODEL") {
            self.ollama.model = v;
        }
        if let Some(v) = env("BEDSIDE_SPEECH_URL") {
            self.speech.base_url = v;
        }
        if let Some(v) = env("BEDSIDE_SPEECH_ENABLED") {
            match v.parse() {
                Ok(flag) => self.speech.enabled = flag,
                Err(_) => tracing::warn!(
                    var = "BEDSIDE_SPEECH_ENABLED",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("BEDSIDE_DATASET") {
            self.personas.dataset = v;
        }
        if let Some(v) = env("BEDSIDE_LOGS_DIR") {
            self.paths.logs_dir = v;
        }
    }

    /// Parse a TOML string into config (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: BedsideConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

// ── Ollama config ───────────────────────────────────────────────

/// Ollama endpoint and model (`[ollama]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL.
    pub base_url: String,
    /// Model name passed to `/api/generate`.
    pub model: String,
    /// Completion request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "virtual-patient".to_string(),
            timeout_seconds: 30,
        }
    }
}

// ── Generation config ───────────────────────────────────────────

/// Sampling options sent with every completion (`[generation]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling cutoff.
    pub top_p: f64,
    /// Repetition penalty.
    pub repeat_penalty: f64,
    /// Context window size in tokens.
    pub num_ctx: u32,
    /// Maximum tokens to generate per reply.
    pub num_predict: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.2,
            num_ctx: 2048,
            num_predict: 150,
        }
    }
}

// ── Speech config ───────────────────────────────────────────────

/// Speech-synthesis service (`[speech]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Whether patient replies are spoken aloud.
    pub enabled: bool,
    /// Speech service base URL.
    pub base_url: String,
    /// Synthesis request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://127.0.0.1:5002".to_string(),
            timeout_seconds: 10,
        }
    }
}

// ── Personas config ─────────────────────────────────────────────

/// Persona harvesting from the training corpus (`[personas]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonasConfig {
    /// Line-delimited JSON corpus to harvest persona lines from.
    pub dataset: String,
    /// Stop harvesting after this many distinct personas.
    pub max_harvest: usize,
    /// Retain only the first N harvested personas.
    pub max_retained: usize,
}

impl Default for PersonasConfig {
    fn default() -> Self {
        Self {
            dataset: "data/train.jsonl".to_string(),
            max_harvest: 50,
            max_retained: 20,
        }
    }
}

// ── Session config ──────────────────────────────────────────────

/// Conversation retention and prompt window (`[session]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum retained conversation turns; oldest evicted beyond this.
    pub history_cap: usize,
    /// Number of recent turns included in each prompt.
    pub prompt_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_cap: 20,
            prompt_window: 3,
        }
    }
}

// ── Paths config ────────────────────────────────────────────────

/// Filesystem paths (`[paths]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for rotated JSON log files.
    pub logs_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: "logs".to_string(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
