//! Completion layer for Dealerbot.
//!
//! # Architecture
//!
//! - [`traits::CompletionClient`] — "send a prompt, get back text"
//! - [`registry`] — static specs for the supported OpenAI-compatible providers
//! - [`http_provider::HttpProvider`] — HTTP client bound to one persona's model + settings
//! - [`retry`] — per-call timeout and optional retry-with-backoff
//! - [`error::CompletionError`] — failure taxonomy with transient classification

pub mod error;
pub mod http_provider;
pub mod registry;
pub mod retry;
pub mod traits;

pub use error::CompletionError;
pub use http_provider::{create_provider, HttpProvider, DEFAULT_HTTP_TIMEOUT};
pub use registry::{ProviderSpec, PROVIDERS};
pub use retry::{complete_with_policy, RetryPolicy};
pub use traits::{CompletionClient, LlmRequestConfig};
