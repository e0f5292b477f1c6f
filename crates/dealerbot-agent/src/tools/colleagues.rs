//! Colleague tools — the research specialist and the business coordinator.
//!
//! Each tool wraps the sales agent's query in its persona prompt and makes
//! exactly one completion call. A failed call surfaces as a tool error, which
//! the registry turns into an observation.

use std::sync::Arc;

use async_trait::async_trait;
use dealerbot_providers::CompletionClient;
use tracing::debug;

use super::base::Tool;

// ─────────────────────────────────────────────
// GetTechnicalDetails (Dru)
// ─────────────────────────────────────────────

pub struct TechnicalDetailsTool {
    client: Arc<dyn CompletionClient>,
}

impl TechnicalDetailsTool {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn prompt(query: &str) -> String {
        format!(
            "You are Dru, a vehicle research specialist. A customer has a question.\n\
             Provide a concise, factual answer based on your knowledge.\n\
             If you don't know the answer, say so. Do not invent information.\n\
             \n\
             Customer's question: \"{query}\"\n\
             \n\
             Your factual response:\n"
        )
    }
}

#[async_trait]
impl Tool for TechnicalDetailsTool {
    fn name(&self) -> &str {
        "GetTechnicalDetails"
    }

    fn description(&self) -> &str {
        "Gets technical specifications or answers specific research questions about a vehicle (e.g., 'what are the safety features of the Honda Accord?')."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        debug!(model = self.client.model(), "consulting research specialist");
        Ok(self.client.complete(&Self::prompt(input)).await?)
    }
}

// ─────────────────────────────────────────────
// GetBusinessDecision (the Boss)
// ─────────────────────────────────────────────

pub struct BusinessDecisionTool {
    client: Arc<dyn CompletionClient>,
}

impl BusinessDecisionTool {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn prompt(query: &str) -> String {
        format!(
            "You are the Boss, the business coordinator. A sales agent needs a decision.\n\
             Base your answer on standard business policies (e.g., firm but fair pricing, \
             small discounts for serious buyers).\n\
             \n\
             Sales agent's query: \"{query}\"\n\
             \n\
             Your decision:\n"
        )
    }
}

#[async_trait]
impl Tool for BusinessDecisionTool {
    fn name(&self) -> &str {
        "GetBusinessDecision"
    }

    fn description(&self) -> &str {
        "Consults the business coordinator for pricing, discounts, and negotiation strategies (e.g., 'can I offer a 5% discount on the Tesla Model 3?')."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        debug!(model = self.client.model(), "consulting business coordinator");
        Ok(self.client.complete(&Self::prompt(input)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerbot_providers::CompletionError;
    use std::sync::Mutex;

    /// Records the prompt it was given and answers with a fixed reply.
    struct RecordingClient {
        reply: Option<String>,
        seen: Mutex<Vec<String>>,
    }

    impl RecordingClient {
        fn new(reply: Option<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for RecordingClient {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.seen.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| CompletionError::Network("connection refused".into()))
        }
        fn model(&self) -> &str {
            "recorder"
        }
        fn display_name(&self) -> &str {
            "Recorder"
        }
    }

    #[tokio::test]
    async fn test_technical_details_wraps_query_once() {
        let client = RecordingClient::new(Some("It has 8 airbags.".into()));
        let tool = TechnicalDetailsTool::new(client.clone());

        let out = tool.execute("safety features of the Honda Accord").await.unwrap();
        assert_eq!(out, "It has 8 airbags.");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("You are Dru, a vehicle research specialist."));
        assert!(seen[0].contains("Customer's question: \"safety features of the Honda Accord\""));
    }

    #[tokio::test]
    async fn test_business_decision_prompt() {
        let client = RecordingClient::new(Some("A 3% discount is acceptable.".into()));
        let tool = BusinessDecisionTool::new(client.clone());

        let out = tool.execute("5% off the Tesla Model 3?").await.unwrap();
        assert_eq!(out, "A 3% discount is acceptable.");
        let seen = client.seen.lock().unwrap();
        assert!(seen[0].starts_with("You are the Boss, the business coordinator."));
        assert!(seen[0].contains("firm but fair pricing"));
        assert!(seen[0].trim_end().ends_with("Your decision:"));
    }

    #[tokio::test]
    async fn test_completion_failure_is_tool_error() {
        let client = RecordingClient::new(None);
        let tool = TechnicalDetailsTool::new(client);
        let err = tool.execute("anything").await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
