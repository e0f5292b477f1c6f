//! Dealerbot Agent — the sales agent's reasoning loop, tools, and chat turns.
//!
//! This crate contains:
//! - **inventory**: vehicle table loading, caching, and search
//! - **tools**: Tool trait, registry, and the dealership's three tools
//! - **react**: ReAct output parser and per-turn transcript
//! - **context**: the sales prompt
//! - **agent_loop**: reasoning ↔ tool-dispatch state machine
//! - **chat**: session-aware turn handling with greeting and apology

pub mod agent_loop;
pub mod chat;
pub mod context;
pub mod inventory;
pub mod react;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use agent_loop::{AgentError, AgentLoop, LoopSettings, TurnOutcome};
pub use chat::{ChatService, TurnReply};
pub use context::ContextBuilder;
pub use inventory::{InventoryError, InventoryStore, InventoryTable};
pub use react::{parse_step, ParseError, ReasoningStep, Transcript};
pub use tools::{Tool, ToolError, ToolRegistry};
