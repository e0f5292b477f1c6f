//! Completion client for OpenAI-compatible HTTP APIs.
//!
//! Talks directly to any `/chat/completions` endpoint (Groq, Gemini's
//! OpenAI-compatible surface, OpenAI, OpenRouter, vLLM) via `reqwest`.
//! The prompt is sent as a single user message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use tracing::{debug, error, warn};

use dealerbot_core::config::schema::ProvidersConfig;
use dealerbot_core::config::{PersonaConfig, ProviderConfig};
use dealerbot_core::types::{ChatCompletionRequest, ChatCompletionResponse, Message};

use crate::error::CompletionError;
use crate::registry::{match_provider, ProviderSpec};
use crate::traits::{CompletionClient, LlmRequestConfig};

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A completion client bound to one provider, one model, and one set of
/// decoding settings.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.groq.com/openai/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Model sent with every request.
    model: String,
    /// Temperature, max_tokens, stop sequences.
    request_config: LlmRequestConfig,
    /// Extra headers to send with each request.
    extra_headers: HeaderMap,
    /// Request timeout, reported in `CompletionError::Timeout`.
    timeout: Duration,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("provider", &self.spec.display_name)
            .field("temperature", &self.request_config.temperature)
            .finish()
    }
}

impl HttpProvider {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `config`         — User's provider config (api_key, api_base, extra_headers)
    /// * `spec`           — Static provider spec from the registry
    /// * `model`          — Model identifier to send
    /// * `request_config` — Decoding settings for this call site
    /// * `timeout`        — Per-request HTTP timeout
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        model: &str,
        request_config: LlmRequestConfig,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let mut extra_headers = HeaderMap::new();
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                if let (Ok(name), Ok(val)) = (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    extra_headers.insert(name, val);
                } else {
                    warn!("Invalid header: {}={}", key, value);
                }
            }
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpProvider {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model: model.to_string(),
            request_config,
            extra_headers,
            timeout,
            spec,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// Decoding settings this client was built with.
    pub fn request_config(&self) -> &LlmRequestConfig {
        &self.request_config
    }

    fn classify_send_error(&self, e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Timeout(self.timeout)
        } else {
            CompletionError::Network(e.to_string())
        }
    }
}

/// Parse a `Retry-After` header given in whole seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl CompletionClient for HttpProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        debug!(
            provider = self.spec.display_name,
            model = %self.model,
            prompt_len = prompt.len(),
            temperature = self.request_config.temperature,
            "Calling completion API"
        );

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: Some(self.request_config.max_tokens),
            temperature: Some(self.request_config.temperature),
            stop: self.request_config.stop.clone(),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .headers(self.extra_headers.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
                self.classify_send_error(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %body,
                "API error"
            );
            if status.as_u16() == 429 {
                return Err(CompletionError::RateLimited {
                    message: body,
                    retry_after,
                });
            }
            return Err(CompletionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    return CompletionError::Timeout(self.timeout);
                }
                error!(provider = self.spec.display_name, error = %e, "Failed to parse completion response");
                CompletionError::MalformedResponse(e.to_string())
            })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                provider = self.spec.display_name,
                total_tokens = usage.total_tokens,
                "completion received"
            );
        }

        parsed
            .into_text()
            .ok_or_else(|| CompletionError::MalformedResponse("response contained no text".into()))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build a client for one persona from the configured providers.
///
/// `stop` is appended to the persona's decoding settings; the sales
/// persona uses it to halt before a hallucinated observation.
pub fn create_provider(
    persona: &PersonaConfig,
    providers: &ProvidersConfig,
    stop: Vec<String>,
    timeout: Duration,
) -> Result<HttpProvider, CompletionError> {
    let (config, spec) = match_provider(persona, providers).ok_or_else(|| {
        CompletionError::NotConfigured(format!(
            "no configured provider for model '{}' (provider '{}'); set its API key",
            persona.model, persona.provider
        ))
    })?;

    debug!(
        provider = spec.display_name,
        model = %persona.model,
        api_base = config.api_base.as_deref().unwrap_or(spec.default_api_base),
        "Creating completion client"
    );

    let request_config = LlmRequestConfig {
        max_tokens: persona.max_tokens,
        temperature: persona.temperature,
        stop,
    };
    HttpProvider::new(config, spec, &persona.model, request_config, timeout)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
