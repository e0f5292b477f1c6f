//! Scripted completion client shared by the unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dealerbot_providers::{CompletionClient, CompletionError};

/// Returns canned responses in order and records every prompt.
pub(crate) struct ScriptedClient {
    responses: Mutex<Vec<Result<String, CompletionError>>>,
    pub(crate) prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    pub(crate) fn new(responses: Vec<&str>) -> Arc<Self> {
        Self::from_results(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub(crate) fn failing(err: CompletionError) -> Arc<Self> {
        Self::from_results(vec![Err(err)])
    }

    pub(crate) fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    fn from_results(responses: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("Final Answer: (no more responses)".into())
        } else {
            responses.remove(0)
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }

    fn display_name(&self) -> &str {
        "Scripted"
    }
}
