//! Tool Registry — name-keyed store the agent loop dispatches through.
//!
//! Registration order is preserved: it is the order tools are listed in
//! the prompt and in "not a valid tool" corrections.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::base::Tool;

/// Dispatch failures that are the model's fault, not the tool's.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolError {
    #[error("{name} is not a valid tool, try one of [{}].", .known.join(", "))]
    UnknownTool { name: String, known: Vec<String> },
}

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// Stores tools keyed by name and dispatches calls.
///
/// Owns `Arc<dyn Tool>` so tools can be shared across concurrent turns.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        info!(tool = tool.name(), "registered tool");
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&i) => self.tools[i] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Look up a tool by exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Check if a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names of all registered tools, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Fail with [`ToolError::UnknownTool`] unless `name` is registered.
    pub fn validate(&self, name: &str) -> Result<(), ToolError> {
        if self.has(name) {
            Ok(())
        } else {
            Err(ToolError::UnknownTool {
                name: name.to_string(),
                known: self.tool_names(),
            })
        }
    }

    /// One `name: description` line per tool, for the prompt.
    pub fn catalog(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Invoke a tool by name.
    ///
    /// An unknown name is an `Err`. A failure inside the tool is not: it
    /// comes back as `Ok("Error executing <name>: <reason>")` so the model
    /// sees it as an observation.
    pub async fn invoke(&self, name: &str, input: &str) -> Result<String, ToolError> {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "tool not found");
            return Err(ToolError::UnknownTool {
                name: name.to_string(),
                known: self.tool_names(),
            });
        };

        match tool.execute(input).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                Ok(format!("Error executing {name}: {e}"))
            }
        }
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
