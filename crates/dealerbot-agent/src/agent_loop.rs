//! Agent loop — the ReAct reasoning ↔ tool-dispatch state machine.
//!
//! One call to [`AgentLoop::run_turn`] drives a single customer turn:
//!
//! ```text
//! Reasoning ──Action──▶ Acting ──observation──▶ Reasoning
//!     │                                            ▲
//!     ├──malformed / unknown tool──(correction)────┘
//!     └──Final Answer──▶ Done
//! ```
//!
//! Every reasoning call counts toward the iteration cap, including the
//! ones that only produce a correction.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dealerbot_core::config::AgentSettings;
use dealerbot_core::types::Message;
use dealerbot_core::utils::truncate_string;
use dealerbot_providers::{complete_with_policy, CompletionClient, CompletionError, RetryPolicy};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::ContextBuilder;
use crate::react::{parse_step, ReasoningStep, Transcript};
use crate::tools::ToolRegistry;

/// Characters of a tool result shown in debug logs.
const OBSERVATION_LOG_CHARS: usize = 200;

/// Why a turn ended without a final answer.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Agent stopped due to iteration limit ({max_iterations} iterations)")]
    IterationLimitExceeded { max_iterations: usize },

    #[error("Agent stopped due to time limit ({limit:?})")]
    DeadlineExceeded { limit: Duration },

    #[error("turn was cancelled")]
    Cancelled,
}

// ─────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────

/// Limits applied to every turn.
#[derive(Clone, Debug)]
pub struct LoopSettings {
    pub max_iterations: usize,
    pub completion_timeout: Duration,
    pub turn_timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from(&AgentSettings::default())
    }
}

impl From<&AgentSettings> for LoopSettings {
    fn from(s: &AgentSettings) -> Self {
        Self {
            max_iterations: s.max_iterations as usize,
            completion_timeout: Duration::from_secs(s.completion_timeout_secs),
            turn_timeout: s.turn_timeout_secs.map(Duration::from_secs),
            retry: RetryPolicy {
                max_retries: s.completion_retries,
                base_delay: Duration::from_millis(s.retry_base_delay_ms),
            },
        }
    }
}

/// A successfully answered turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub answer: String,
    /// Reasoning calls made, corrective ones included.
    pub iterations: usize,
    /// Tools actually executed.
    pub tool_calls: usize,
}

enum LoopState {
    Reasoning,
    Acting {
        log: String,
        tool_name: String,
        tool_input: String,
    },
    Done(String),
}

// ─────────────────────────────────────────────
// AgentLoop
// ─────────────────────────────────────────────

/// Drives the sales agent through one turn at a time.
///
/// Holds only shared, read-only state, so a single instance serves any
/// number of concurrent turns.
pub struct AgentLoop {
    client: Arc<dyn CompletionClient>,
    tools: Arc<ToolRegistry>,
    context: ContextBuilder,
    settings: LoopSettings,
}

impl AgentLoop {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        tools: Arc<ToolRegistry>,
        context: ContextBuilder,
        settings: LoopSettings,
    ) -> Self {
        info!(
            model = client.model(),
            tools = tools.len(),
            max_iterations = settings.max_iterations,
            "agent loop initialized"
        );
        Self {
            client,
            tools,
            context,
            settings,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn context(&self) -> &ContextBuilder {
        &self.context
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Answer one customer message given the prior conversation.
    pub async fn run_turn(
        &self,
        input: &str,
        history: &[Message],
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, AgentError> {
        let started = Instant::now();
        let mut transcript = Transcript::new();
        let mut iterations = 0;
        let mut tool_calls = 0;
        let mut state = LoopState::Reasoning;

        loop {
            state = match state {
                LoopState::Reasoning => {
                    if iterations >= self.settings.max_iterations {
                        warn!(
                            max_iterations = self.settings.max_iterations,
                            "no final answer within iteration limit"
                        );
                        return Err(AgentError::IterationLimitExceeded {
                            max_iterations: self.settings.max_iterations,
                        });
                    }
                    self.checkpoint(cancel, started)?;
                    iterations += 1;

                    let prompt = self
                        .context
                        .build_prompt(&self.tools, history, input, &transcript);
                    debug!(iteration = iterations, prompt_len = prompt.len(), "reasoning call");

                    let raw = self
                        .guarded(
                            complete_with_policy(
                                self.client.as_ref(),
                                &prompt,
                                self.settings.completion_timeout,
                                &self.settings.retry,
                            ),
                            cancel,
                            started,
                        )
                        .await??;
                    debug!(iteration = iterations, output = %raw, "model output");

                    self.classify(&raw, &mut transcript)
                }

                LoopState::Acting {
                    log,
                    tool_name,
                    tool_input,
                } => {
                    self.checkpoint(cancel, started)?;
                    info!(tool = %tool_name, iteration = iterations, "executing tool");

                    // The name was validated while classifying.
                    let observation = match self
                        .guarded(self.tools.invoke(&tool_name, &tool_input), cancel, started)
                        .await?
                    {
                        Ok(observation) => observation,
                        Err(e) => e.to_string(),
                    };
                    tool_calls += 1;
                    debug!(
                        tool = %tool_name,
                        result = %truncate_string(&observation, OBSERVATION_LOG_CHARS),
                        "tool result"
                    );

                    transcript.record_action(&log, &tool_name, &tool_input, observation);
                    LoopState::Reasoning
                }

                LoopState::Done(answer) => {
                    info!(iterations, tool_calls, "turn finished");
                    return Ok(TurnOutcome {
                        answer,
                        iterations,
                        tool_calls,
                    });
                }
            };
        }
    }

    /// Decide the next state from one model response.
    fn classify(&self, raw: &str, transcript: &mut Transcript) -> LoopState {
        match parse_step(raw) {
            ReasoningStep::FinalAnswer { text, .. } => LoopState::Done(text),

            ReasoningStep::Action {
                tool_name,
                tool_input,
                ..
            } => match self.tools.validate(&tool_name) {
                Ok(()) => LoopState::Acting {
                    log: raw.to_string(),
                    tool_name,
                    tool_input,
                },
                Err(e) => {
                    warn!(tool = %tool_name, "model requested unknown tool");
                    transcript.record_correction(raw, e.to_string());
                    LoopState::Reasoning
                }
            },

            ReasoningStep::Malformed(err) => {
                warn!(reason = %err, "unparseable model output");
                transcript.record_correction(raw, err.corrective_observation());
                LoopState::Reasoning
            }
        }
    }

    /// Fail fast if the turn was cancelled or ran out of time.
    fn checkpoint(&self, cancel: &CancellationToken, started: Instant) -> Result<(), AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        if let Some(limit) = self.settings.turn_timeout {
            if started.elapsed() >= limit {
                return Err(AgentError::DeadlineExceeded { limit });
            }
        }
        Ok(())
    }

    /// Await `fut`, giving up early on cancellation or the turn deadline.
    async fn guarded<F: Future>(
        &self,
        fut: F,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<F::Output, AgentError> {
        let deadline = async {
            match self.settings.turn_timeout {
                Some(limit) => {
                    tokio::time::sleep_until(started + limit).await;
                    limit
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            limit = deadline => Err(AgentError::DeadlineExceeded { limit }),
            out = fut => Ok(out),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
