//! Dealerbot core — shared types, configuration, sessions, and utilities.
//!
//! - **types**: conversation messages, sessions, completion wire format
//! - **config**: JSON schema, loader, env overrides
//! - **session**: in-memory chat history per session key
//! - **utils**: path and string helpers

pub mod config;
pub mod session;
pub mod types;
pub mod utils;

pub use types::{Message, Role, Session};
