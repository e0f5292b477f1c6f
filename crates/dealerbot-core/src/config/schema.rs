//! Configuration schema.
//!
//! Hierarchy: `Config` → `AgentSettings`, `PersonasConfig`, `ProvidersConfig`,
//! `InventoryConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.dealerbot/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agent: AgentSettings,
    pub personas: PersonasConfig,
    pub providers: ProvidersConfig,
    pub inventory: InventoryConfig,
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

/// Settings for the sales agent's reasoning loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    /// Name the sales persona introduces itself with.
    pub name: String,
    /// Maximum reasoning iterations per turn before giving up.
    pub max_iterations: u32,
    /// How many past messages are included in the prompt.
    pub history_window: usize,
    /// Timeout for a single reasoning completion, in seconds.
    pub completion_timeout_secs: u64,
    /// Optional wall-clock cap for a whole turn, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_timeout_secs: Option<u64>,
    /// Retries for transient completion failures. 0 aborts the turn immediately.
    pub completion_retries: u32,
    /// Base delay for the exponential retry backoff, in milliseconds.
    pub retry_base_delay_ms: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: "John".to_string(),
            max_iterations: 10,
            history_window: 10,
            completion_timeout_secs: 60,
            turn_timeout_secs: None,
            completion_retries: 0,
            retry_base_delay_ms: 1000,
        }
    }
}

// ─────────────────────────────────────────────
// Personas
// ─────────────────────────────────────────────

/// Model selection for one persona.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonaConfig {
    /// Provider name from the registry (e.g. `"groq"`).
    pub provider: String,
    /// Model identifier sent to the provider.
    pub model: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Maximum tokens to generate per completion.
    pub max_tokens: u32,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama3-70b-8192".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

impl PersonaConfig {
    fn new(provider: &str, model: &str, temperature: f64) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            temperature,
            ..Self::default()
        }
    }
}

/// The three personas: the sales agent drives the loop, research and
/// business are consulted from inside tools.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonasConfig {
    pub sales: PersonaConfig,
    pub research: PersonaConfig,
    pub business: PersonaConfig,
}

impl Default for PersonasConfig {
    fn default() -> Self {
        Self {
            sales: PersonaConfig::new("groq", "llama3-70b-8192", 0.8),
            research: PersonaConfig::new("gemini", "gemini-pro", 0.1),
            business: PersonaConfig::new("groq", "llama3-70b-8192", 0.4),
        }
    }
}

impl PersonasConfig {
    /// Look up a persona by role name (`"sales"`, `"research"`, `"business"`).
    pub fn get_mut(&mut self, role: &str) -> Option<&mut PersonaConfig> {
        match role {
            "sales" => Some(&mut self.sales),
            "research" => Some(&mut self.research),
            "business" => Some(&mut self.business),
            _ => None,
        }
    }

    /// All personas with their role names, in display order.
    pub fn iter(&self) -> [(&'static str, &PersonaConfig); 3] {
        [
            ("sales", &self.sales),
            ("research", &self.research),
            ("business", &self.business),
        ]
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single completion provider (API key, base URL, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// All provider configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub groq: ProviderConfig,
    pub gemini: ProviderConfig,
    pub openai: ProviderConfig,
    pub openrouter: ProviderConfig,
    pub vllm: ProviderConfig,
}

impl ProvidersConfig {
    /// Provider names in registry order.
    pub const NAMES: [&'static str; 5] = ["groq", "gemini", "openai", "openrouter", "vllm"];

    /// Get a provider config by name (e.g. `"groq"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "groq" => Some(&self.groq),
            "gemini" => Some(&self.gemini),
            "openai" => Some(&self.openai),
            "openrouter" => Some(&self.openrouter),
            "vllm" => Some(&self.vllm),
            _ => None,
        }
    }

    /// Mutable variant of [`get_by_name`](Self::get_by_name).
    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        match name {
            "groq" => Some(&mut self.groq),
            "gemini" => Some(&mut self.gemini),
            "openai" => Some(&mut self.openai),
            "openrouter" => Some(&mut self.openrouter),
            "vllm" => Some(&mut self.vllm),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Inventory
// ─────────────────────────────────────────────

/// Where the vehicle inventory table lives.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryConfig {
    /// Path to the inventory CSV. Relative paths resolve against the working directory.
    pub path: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: "data/vehicles.csv".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
