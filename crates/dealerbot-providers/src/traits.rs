//! Completion Client trait — "send a prompt, get back text".
//!
//! Each persona gets its own client instance with its own model and
//! decoding settings. Clients are built once at startup and shared
//! read-only (`Arc<dyn CompletionClient>`) across concurrent turns.

use async_trait::async_trait;

use crate::error::CompletionError;

/// Decoding settings fixed per call site.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Stop sequences; generation halts before any of them.
    pub stop: Vec<String>,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
            stop: Vec::new(),
        }
    }
}

/// A request/response completion backend.
///
/// Failures (timeout, rate limit, malformed response) are surfaced as
/// [`CompletionError`] and are never retried by the implementation.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` as a single user message and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Model identifier this client sends.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
