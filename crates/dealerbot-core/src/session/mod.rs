//! Session manager — ordered, append-only chat history per session key.
//!
//! Sessions live in process memory only; nothing is written to disk.

pub mod manager;

pub use manager::{SessionManager, SessionSummary};
