//! Tool trait — the interface every agent tool implements.

use async_trait::async_trait;

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// A named capability the sales agent can invoke from its reasoning text.
///
/// The agent loop lists tools in the prompt via `name()` and
/// `description()` and dispatches `Action:` lines to `execute()` with the
/// verbatim `Action Input:` text.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Exact, case-sensitive name the model writes after `Action:`.
    fn name(&self) -> &str;

    /// Natural-language description shown to the model.
    fn description(&self) -> &str;

    /// Run the tool on free-form text input.
    ///
    /// On failure, return an `Err` — the registry turns it into an
    /// observation string so the model can react to it.
    async fn execute(&self, input: &str) -> anyhow::Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "Upper"
        }
        fn description(&self) -> &str {
            "Uppercases its input"
        }
        async fn execute(&self, input: &str) -> anyhow::Result<String> {
            Ok(input.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_tool_is_object_safe() {
        let tool: Box<dyn Tool> = Box::new(Upper);
        assert_eq!(tool.name(), "Upper");
        assert_eq!(tool.execute("camry").await.unwrap(), "CAMRY");
    }
}
