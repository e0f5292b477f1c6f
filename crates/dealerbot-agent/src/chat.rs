//! Chat service — one conversation turn at a time, per session.
//!
//! Wraps the agent loop with session bookkeeping: greeting new sessions,
//! appending the customer's message and the reply, and turning failures
//! into an apology the customer can read.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dealerbot_core::config::Config;
use dealerbot_core::session::SessionManager;
use dealerbot_core::types::Message;
use dealerbot_core::utils::expand_home;
use dealerbot_providers::{create_provider, CompletionClient, CompletionError, DEFAULT_HTTP_TIMEOUT};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::agent_loop::{AgentLoop, LoopSettings, TurnOutcome};
use crate::context::ContextBuilder;
use crate::inventory::InventoryStore;
use crate::tools::dealership_tools;

/// Stop sequence for the sales persona; keeps the model from writing its own observations.
pub const OBSERVATION_STOP: &str = "\nObservation:";

/// What the customer sees after a turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnReply {
    pub text: String,
    /// `None` when the turn failed and `text` is an apology.
    pub outcome: Option<TurnOutcome>,
}

impl TurnReply {
    pub fn is_error(&self) -> bool {
        self.outcome.is_none()
    }
}

// ─────────────────────────────────────────────
// ChatService
// ─────────────────────────────────────────────

pub struct ChatService {
    agent: AgentLoop,
    sessions: SessionManager,
    inventory: Arc<InventoryStore>,
    history_window: usize,
    /// Serializes turns within one session; different sessions run concurrently.
    turn_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatService {
    pub fn new(agent: AgentLoop, inventory: Arc<InventoryStore>, history_window: usize) -> Self {
        Self {
            agent,
            sessions: SessionManager::new(),
            inventory,
            history_window,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build the three persona clients, the tool set, and the loop from config.
    pub fn from_config(config: &Config) -> Result<Self, CompletionError> {
        let completion_timeout = Duration::from_secs(config.agent.completion_timeout_secs);

        let sales: Arc<dyn CompletionClient> = Arc::new(create_provider(
            &config.personas.sales,
            &config.providers,
            vec![OBSERVATION_STOP.to_string()],
            completion_timeout,
        )?);
        let research: Arc<dyn CompletionClient> = Arc::new(create_provider(
            &config.personas.research,
            &config.providers,
            Vec::new(),
            DEFAULT_HTTP_TIMEOUT,
        )?);
        let business: Arc<dyn CompletionClient> = Arc::new(create_provider(
            &config.personas.business,
            &config.providers,
            Vec::new(),
            DEFAULT_HTTP_TIMEOUT,
        )?);

        let inventory = Arc::new(InventoryStore::new(expand_home(&config.inventory.path)));
        let tools = dealership_tools(inventory.clone(), research, business);
        let agent = AgentLoop::new(
            sales,
            Arc::new(tools),
            ContextBuilder::new(&config.agent.name),
            LoopSettings::from(&config.agent),
        );

        Ok(Self::new(agent, inventory, config.agent.history_window))
    }

    pub fn agent(&self) -> &AgentLoop {
        &self.agent
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }

    /// Warning to show at startup, if the inventory is unusable or missing.
    pub fn inventory_warning(&self) -> Option<String> {
        match self.inventory.load() {
            Ok(table) => table.warning(),
            Err(e) => Some(format!("Inventory could not be loaded: {e}")),
        }
    }

    /// Ensure the session exists and starts with the greeting.
    pub fn open_session(&self, key: &str) -> Vec<Message> {
        if self
            .sessions
            .seed_if_empty(key, Message::assistant(self.agent.context().greeting()))
        {
            info!(session_key = key, "opened session");
        }
        self.history(key)
    }

    /// Full history of a session, oldest first.
    pub fn history(&self, key: &str) -> Vec<Message> {
        self.sessions.get_history(key, usize::MAX)
    }

    /// Forget the conversation and greet again.
    pub fn reset(&self, key: &str) -> Vec<Message> {
        self.sessions.clear(key);
        self.open_session(key)
    }

    fn turn_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.turn_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// End a session: wait for its in-flight turn, then forget its history.
    ///
    /// Returns `true` if the session existed. The session's turn lock is
    /// dropped too unless another turn is already waiting on it.
    pub async fn close_session(&self, key: &str) -> bool {
        let lock = self.turn_lock(key);
        let existed = {
            let _turn = lock.lock().await;
            self.sessions.delete(key)
        };

        let mut locks = self.turn_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours means nobody else is waiting.
        if locks
            .get(key)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(held) == 2)
        {
            locks.remove(key);
        }
        if existed {
            info!(session_key = key, "closed session");
        }
        existed
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.turn_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run one customer turn and record it.
    ///
    /// Always yields something to show: the agent's answer, or an apology
    /// naming the failure. Either way the reply is appended to history.
    pub async fn handle_turn(
        &self,
        key: &str,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> TurnReply {
        let lock = self.turn_lock(key);
        let _turn = lock.lock().await;

        self.open_session(key);
        let history = self.sessions.get_history(key, self.history_window);
        self.sessions.add_message(key, Message::user(user_text));

        let reply = match self.agent.run_turn(user_text, &history, cancel).await {
            Ok(outcome) => TurnReply {
                text: outcome.answer.clone(),
                outcome: Some(outcome),
            },
            Err(e) => {
                error!(session_key = key, error = %e, "turn failed");
                TurnReply {
                    text: format!(
                        "Sorry, I encountered an error: {e}. Please try rephrasing your question."
                    ),
                    outcome: None,
                }
            }
        };

        self.sessions.add_message(key, Message::assistant(&reply.text));
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerbot_core::types::Role;
    use std::path::Path;

    use crate::inventory::InventoryTable;
    use crate::test_support::ScriptedClient;
    use crate::tools::{SearchInventoryTool, Tool, ToolRegistry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often the agent reached for it.
    #[derive(Default)]
    struct CountingTool {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "GetBusinessDecision"
        }
        fn description(&self) -> &str {
            "Consults the business coordinator"
        }
        async fn execute(&self, _input: &str) -> anyhow::Result<String> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok("Approved.".into())
        }
    }

    fn service(client: Arc<ScriptedClient>) -> ChatService {
        service_with(client, |_| {})
    }

    fn service_with(
        client: Arc<ScriptedClient>,
        extra_tools: impl FnOnce(&mut ToolRegistry),
    ) -> ChatService {
        let table = InventoryTable::from_csv_reader(
            "id,make,model,year,price,color\n1,Toyota,Camry,2022,25000,black\n".as_bytes(),
            Path::new("inline.csv"),
        )
        .unwrap();
        let inventory = Arc::new(InventoryStore::with_table("inline.csv", table));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(SearchInventoryTool::new(inventory.clone())));
        extra_tools(&mut tools);

        let agent = AgentLoop::new(
            client,
            Arc::new(tools),
            ContextBuilder::new("John"),
            LoopSettings {
                max_iterations: 3,
                ..LoopSettings::default()
            },
        );
        ChatService::new(agent, inventory, 10)
    }

    #[test]
    fn test_open_session_greets_once() {
        let chat = service(ScriptedClient::new(vec![]));
        let first = chat.open_session("web:1");
        let second = chat.open_session("web:1");

        assert_eq!(first.len(), 1);
        assert_eq!(second, first);
        assert_eq!(first[0].role, Role::Assistant);
        assert_eq!(
            first[0].content,
            "Hi, I'm John! How can I help you find the perfect car today?"
        );
    }

    #[tokio::test]
    async fn test_successful_turn_is_recorded() {
        let client = ScriptedClient::new(vec![
            "Thought: check\nAction: SearchInventory\nAction Input: Toyota",
            "Final Answer: We have a black 2022 Toyota Camry for $25,000.",
        ]);
        let chat = service(client);

        let reply = chat
            .handle_turn("web:1", "Do you have any Toyotas?", &CancellationToken::new())
            .await;
        assert!(!reply.is_error());
        assert_eq!(reply.text, "We have a black 2022 Toyota Camry for $25,000.");
        assert_eq!(reply.outcome.as_ref().unwrap().tool_calls, 1);

        let history = chat.history("web:1");
        assert_eq!(history.len(), 3);
        assert_eq!(history[1], Message::user("Do you have any Toyotas?"));
        assert_eq!(history[2], Message::assistant(&reply.text));
    }

    #[tokio::test]
    async fn test_failed_turn_appends_apology() {
        let client = ScriptedClient::failing(CompletionError::RateLimited {
            message: "slow down".into(),
            retry_after: None,
        });
        let chat = service(client);

        let reply = chat
            .handle_turn("web:1", "Any SUVs?", &CancellationToken::new())
            .await;
        assert!(reply.is_error());
        assert_eq!(
            reply.text,
            "Sorry, I encountered an error: rate limited by provider: slow down. \
             Please try rephrasing your question."
        );

        let history = chat.history("web:1");
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].content, reply.text);
    }

    #[tokio::test]
    async fn test_timeout_on_first_call_apologizes() {
        let client = ScriptedClient::failing(CompletionError::Timeout(Duration::from_secs(60)));
        let tool = Arc::new(CountingTool::default());
        let chat = service_with(client.clone(), |tools| tools.register(tool.clone()));

        let reply = chat
            .handle_turn("web:1", "Any Toyotas?", &CancellationToken::new())
            .await;
        assert!(reply.is_error());
        assert!(reply.text.starts_with("Sorry, I encountered an error: completion timed out"));
        assert!(reply.text.ends_with("Please try rephrasing your question."));

        // The scratchpad stays empty and the tool never runs.
        assert_eq!(client.calls(), 1);
        assert_eq!(tool.runs.load(Ordering::SeqCst), 0);
        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].ends_with("Human: Any Toyotas?\n\n"));
    }

    #[tokio::test]
    async fn test_counting_tool_runs_when_asked() {
        let client = ScriptedClient::new(vec![
            "Action: GetBusinessDecision\nAction Input: 5% off?",
            "Final Answer: We can do that.",
        ]);
        let tool = Arc::new(CountingTool::default());
        let chat = service_with(client, |tools| tools.register(tool.clone()));

        let reply = chat.handle_turn("k", "discount?", &CancellationToken::new()).await;
        assert_eq!(reply.text, "We can do that.");
        assert_eq!(tool.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_iteration_limit_apology() {
        let client = ScriptedClient::new(vec!["nonsense"; 3]);
        let chat = service(client);

        let reply = chat.handle_turn("k", "hi", &CancellationToken::new()).await;
        assert!(reply.is_error());
        assert!(reply.text.contains("iteration limit"));
    }

    #[tokio::test]
    async fn test_history_excludes_current_message() {
        let client = ScriptedClient::new(vec!["Final Answer: Sure.", "Final Answer: $25,000."]);
        let chat = service(client.clone());
        let cancel = CancellationToken::new();

        chat.handle_turn("k", "Do you have a Camry?", &cancel).await;
        chat.handle_turn("k", "How much?", &cancel).await;

        let prompts = client.prompts.lock().unwrap();
        assert!(!prompts[0].contains("Human: Do you have a Camry?\nJohn"));
        assert!(prompts[1].contains("Human: Do you have a Camry?\nJohn: Sure."));
        assert_eq!(prompts[1].matches("Human: How much?").count(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let client = ScriptedClient::new(vec!["Final Answer: A", "Final Answer: B"]);
        let chat = service(client);
        let cancel = CancellationToken::new();

        chat.handle_turn("alice", "one", &cancel).await;
        chat.handle_turn("bob", "two", &cancel).await;

        assert_eq!(chat.history("alice")[1].content, "one");
        assert_eq!(chat.history("bob")[1].content, "two");
        assert_eq!(chat.sessions().list_sessions().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_starts_over() {
        let chat = service(ScriptedClient::new(vec!["Final Answer: ok"]));
        chat.handle_turn("k", "hello", &CancellationToken::new()).await;
        assert_eq!(chat.history("k").len(), 3);

        let fresh = chat.reset("k");
        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].content.starts_with("Hi, I'm John!"));
    }

    #[tokio::test]
    async fn test_close_session_forgets_history_and_lock() {
        let chat = service(ScriptedClient::new(vec!["Final Answer: ok", "Final Answer: again"]));
        let cancel = CancellationToken::new();

        chat.handle_turn("a", "hello", &cancel).await;
        chat.handle_turn("b", "hello", &cancel).await;
        assert_eq!(chat.tracked_locks(), 2);

        assert!(chat.close_session("a").await);
        assert!(chat.history("a").is_empty());
        assert_eq!(chat.history("b").len(), 3);
        assert_eq!(chat.tracked_locks(), 1);

        assert!(!chat.close_session("a").await);
        assert_eq!(chat.tracked_locks(), 1);
    }

    #[tokio::test]
    async fn test_close_session_keeps_lock_with_waiting_turn() {
        let chat = service(ScriptedClient::new(vec![]));
        chat.open_session("k");

        let waiting = chat.turn_lock("k");
        assert!(chat.close_session("k").await);
        assert_eq!(chat.tracked_locks(), 1);

        drop(waiting);
        assert!(!chat.close_session("k").await);
        assert_eq!(chat.tracked_locks(), 0);
    }

    #[test]
    fn test_inventory_warning_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let inventory = Arc::new(InventoryStore::new(dir.path().join("none.csv")));
        let agent = AgentLoop::new(
            ScriptedClient::new(vec![]),
            Arc::new(ToolRegistry::new()),
            ContextBuilder::new("John"),
            LoopSettings::default(),
        );
        let chat = ChatService::new(agent, inventory, 10);
        assert!(chat.inventory_warning().unwrap().contains("none.csv"));
    }

    #[test]
    fn test_from_config_requires_keys() {
        let config = Config::default();
        assert!(matches!(
            ChatService::from_config(&config),
            Err(CompletionError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_from_config_with_keys() {
        let mut config = Config::default();
        config.providers.groq.api_key = "gsk-test".into();
        config.providers.gemini.api_key = "g-test".into();

        let chat = ChatService::from_config(&config).unwrap();
        assert_eq!(chat.agent().tools().tool_names(), vec![
            "SearchInventory",
            "GetTechnicalDetails",
            "GetBusinessDecision",
        ]);
        assert_eq!(chat.agent().settings().max_iterations, 10);
    }
}
