//! Context builder — assembles the sales agent's ReAct prompt.
//!
//! The prompt is a single text block: persona, tool catalog, format
//! instructions, dealership rules, recent conversation, the customer's
//! input, and the scratchpad of this turn's tool rounds.

use dealerbot_core::types::{Message, Role};

use crate::react::Transcript;
use crate::tools::ToolRegistry;

const FORMAT_INSTRUCTIONS: &str = "\
To answer the customer's request, you MUST use the following format:

Thought: Do I need to use a tool? Yes. I need to understand what the user wants and then decide which tool is best to use. I will reason about this and then act.
Action: The action to take. It MUST be one of the following: {tool_names}.
Action Input: The input to the action.
Observation: The result of the action.

... (this Thought/Action/Action Input/Observation can repeat N times)

Thought: I have now gathered enough information and can construct a final answer for the user.
Final Answer: [A final, comprehensive, and friendly response to the user's original question. This is what the user will see. Do not just repeat the tool output; synthesize the information into a conversational response.]";

const RULES: &str = "\
---
Here are some rules to follow:
1.  Always start with a friendly greeting and aim to build rapport.
2.  First, use the `SearchInventory` tool to see if you can find what the customer is asking for.
3.  If the customer asks a technical question that the inventory search doesn't answer, use the `GetTechnicalDetails` tool.
4.  If the customer wants to negotiate or asks about pricing policies, use the `GetBusinessDecision` tool.
5.  Do not make up information. If you don't know something, use a tool to find out or say that you don't know.
6.  Your \"Final Answer\" should be a single, helpful, and conversational response directed to the customer. Do not include the \"Thought:\" process in the final answer.
---";

// ─────────────────────────────────────────────
// Context builder
// ─────────────────────────────────────────────

/// Builds the reasoning prompt for each step of a turn.
#[derive(Clone, Debug)]
pub struct ContextBuilder {
    agent_name: String,
}

impl ContextBuilder {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// The assistant's opening line for a fresh session.
    pub fn greeting(&self) -> String {
        format!(
            "Hi, I'm {}! How can I help you find the perfect car today?",
            self.agent_name
        )
    }

    fn build_identity(&self) -> String {
        format!(
            "You are {}, a friendly, professional, and highly capable AI car sales expert.\n\
             Your goal is to understand the customer's needs, provide them with the best options from our inventory,\n\
             and answer their questions accurately by collaborating with your specialized AI colleagues.",
            self.agent_name
        )
    }

    fn build_history(&self, history: &[Message]) -> Option<String> {
        if history.is_empty() {
            return None;
        }
        let lines: Vec<String> = history
            .iter()
            .map(|m| match m.role {
                Role::User => format!("Human: {}", m.content),
                Role::Assistant => format!("{}: {}", self.agent_name, m.content),
            })
            .collect();
        Some(format!("Conversation so far:\n{}", lines.join("\n")))
    }

    /// Build the full prompt for one reasoning step.
    pub fn build_prompt(
        &self,
        tools: &ToolRegistry,
        history: &[Message],
        input: &str,
        transcript: &Transcript,
    ) -> String {
        let mut parts = vec![
            self.build_identity(),
            format!(
                "You have access to the following tools:\n{}",
                tools.catalog()
            ),
            FORMAT_INSTRUCTIONS.replace("{tool_names}", &tools.tool_names().join(", ")),
            RULES.to_string(),
        ];
        if let Some(history) = self.build_history(history) {
            parts.push(history);
        }
        parts.push("Let's begin!".to_string());
        parts.push(format!("Human: {input}"));

        let mut prompt = parts.join("\n\n");
        prompt.push_str("\n\n");
        prompt.push_str(&transcript.render());
        prompt
    }
}
