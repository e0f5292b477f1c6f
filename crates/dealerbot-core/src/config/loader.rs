//! Config loader — reads `~/.dealerbot/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.dealerbot/config.json`
//! 3. Environment variables `DEALERBOT_<SECTION>__<FIELD>` (override JSON)
//! 4. Conventional provider key variables (`GROQ_API_KEY`, ...) when a key is still empty

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProvidersConfig};

/// Conventional API-key environment variable for each provider.
const PROVIDER_ENV_KEYS: &[(&str, &str)] = &[
    ("groq", "GROQ_API_KEY"),
    ("gemini", "GOOGLE_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
    ("openrouter", "OPENROUTER_API_KEY"),
    ("vllm", "VLLM_API_KEY"),
];

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// The conventional API-key variable for a provider (e.g. `GROQ_API_KEY`).
pub fn provider_env_key(name: &str) -> Option<&'static str> {
    PROVIDER_ENV_KEYS
        .iter()
        .find(|(provider, _)| *provider == name)
        .map(|(_, key)| *key)
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    apply_env_overrides(read_config_file(path))
}

/// Read the JSON file only, without env overrides.
fn read_config_file(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `DEALERBOT_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `DEALERBOT_AGENT__NAME` → `agent.name`
/// - `DEALERBOT_AGENT__MAX_ITERATIONS` → `agent.max_iterations`
/// - `DEALERBOT_AGENT__COMPLETION_RETRIES` → `agent.completion_retries`
/// - `DEALERBOT_INVENTORY__PATH` → `inventory.path`
/// - `DEALERBOT_PERSONAS__<ROLE>__MODEL` → `personas.<role>.model`
/// - `DEALERBOT_PERSONAS__<ROLE>__TEMPERATURE` → `personas.<role>.temperature`
/// - `DEALERBOT_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `DEALERBOT_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("DEALERBOT_AGENT__NAME") {
        config.agent.name = val;
    }
    if let Ok(val) = std::env::var("DEALERBOT_AGENT__MAX_ITERATIONS") {
        if let Ok(n) = val.parse::<u32>() {
            config.agent.max_iterations = n;
        }
    }
    if let Ok(val) = std::env::var("DEALERBOT_AGENT__COMPLETION_RETRIES") {
        if let Ok(n) = val.parse::<u32>() {
            config.agent.completion_retries = n;
        }
    }
    if let Ok(val) = std::env::var("DEALERBOT_INVENTORY__PATH") {
        config.inventory.path = val;
    }

    for role in ["sales", "research", "business"] {
        let upper = role.to_uppercase();
        let Some(persona) = config.personas.get_mut(role) else {
            continue;
        };
        if let Ok(val) = std::env::var(format!("DEALERBOT_PERSONAS__{upper}__MODEL")) {
            persona.model = val;
        }
        if let Ok(val) = std::env::var(format!("DEALERBOT_PERSONAS__{upper}__TEMPERATURE")) {
            if let Ok(t) = val.parse::<f64>() {
                persona.temperature = t;
            }
        }
    }

    apply_provider_env(&mut config.providers);
    config
}

/// Apply env var overrides for every provider, then fall back to the
/// conventional key variables.
fn apply_provider_env(providers: &mut ProvidersConfig) {
    for name in ProvidersConfig::NAMES {
        let upper = name.to_uppercase();
        let Some(provider) = providers.get_by_name_mut(name) else {
            continue;
        };
        if let Ok(val) = std::env::var(format!("DEALERBOT_PROVIDERS__{upper}__API_KEY")) {
            provider.api_key = val;
        }
        if let Ok(val) = std::env::var(format!("DEALERBOT_PROVIDERS__{upper}__API_BASE")) {
            provider.api_base = Some(val);
        }
        if provider.api_key.is_empty() {
            if let Some(key) = provider_env_key(name).and_then(|k| std::env::var(k).ok()) {
                debug!(provider = name, "using API key from conventional env var");
                provider.api_key = key;
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
