//! Provider registry — static specs for the supported OpenAI-compatible backends.
//!
//! Each `ProviderSpec` describes how to reach a provider; the persona config
//! names the provider explicitly, with model-keyword matching as a fallback.

use dealerbot_core::config::schema::ProvidersConfig;
use dealerbot_core::config::{PersonaConfig, ProviderConfig};

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one completion provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"groq"`), matches the config key.
    pub name: &'static str,
    /// Human-readable name for logs.
    pub display_name: &'static str,
    /// Keywords to match in model names (lowercase).
    pub keywords: &'static [&'static str],
    /// Default OpenAI-compatible API base URL.
    pub default_api_base: &'static str,
    /// Local/self-hosted providers do not require an API key.
    pub is_local: bool,
}

/// Supported providers, in matching priority order.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "groq",
        display_name: "Groq",
        keywords: &["llama", "mixtral", "gemma"],
        default_api_base: "https://api.groq.com/openai/v1",
        is_local: false,
    },
    ProviderSpec {
        name: "gemini",
        display_name: "Gemini",
        keywords: &["gemini"],
        default_api_base: "https://generativelanguage.googleapis.com/v1beta/openai",
        is_local: false,
    },
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        keywords: &["gpt", "o1", "o3"],
        default_api_base: "https://api.openai.com/v1",
        is_local: false,
    },
    ProviderSpec {
        name: "openrouter",
        display_name: "OpenRouter",
        keywords: &["openrouter"],
        default_api_base: "https://openrouter.ai/api/v1",
        is_local: false,
    },
    ProviderSpec {
        name: "vllm",
        display_name: "vLLM",
        keywords: &["vllm"],
        default_api_base: "http://localhost:8000/v1",
        is_local: true,
    },
];

/// Find a provider spec by its name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|s| s.name == name)
}

/// Find the first provider whose keywords appear in the model name.
pub fn find_by_model(model: &str) -> Option<&'static ProviderSpec> {
    let model = model.to_lowercase();
    PROVIDERS
        .iter()
        .find(|s| s.keywords.iter().any(|kw| model.contains(kw)))
}

/// Resolve the provider for a persona: explicit name first, then model keywords.
///
/// Returns the provider entry together with that provider's config, or `None` when
/// no provider matches or the matching provider has no API key.
pub fn match_provider<'a>(
    persona: &PersonaConfig,
    providers: &'a ProvidersConfig,
) -> Option<(&'a ProviderConfig, &'static ProviderSpec)> {
    let spec = if persona.provider.is_empty() {
        find_by_model(&persona.model)?
    } else {
        find_by_name(&persona.provider)?
    };
    let config = providers.get_by_name(spec.name)?;
    if config.is_configured() || spec.is_local {
        Some((config, spec))
    } else {
        None
    }
}
