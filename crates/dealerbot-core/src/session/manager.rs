//! In-memory session store.
//!
//! Each chat session is an append-only, ordered list of messages held in
//! process memory. Appends to a session are serialized by the write lock;
//! concurrent sessions are independent.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{Message, Session};

// ─────────────────────────────────────────────
// SessionManager
// ─────────────────────────────────────────────

/// Manages conversation sessions in memory.
///
/// Thread-safe via `RwLock` — multiple readers, exclusive writer.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    /// Create an empty session manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a session, creating the session if needed.
    pub fn add_message(&self, key: &str, message: Message) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .entry(key.to_string())
            .or_insert_with(|| Session::new(key));
        session.messages.push(message);
        session.updated_at = Utc::now();
    }

    /// Append a message only if the session has no messages yet.
    ///
    /// Returns `true` if the message was added. The check and the append
    /// happen under one write lock.
    pub fn seed_if_empty(&self, key: &str, message: Message) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .entry(key.to_string())
            .or_insert_with(|| Session::new(key));
        if !session.messages.is_empty() {
            return false;
        }
        session.messages.push(message);
        session.updated_at = Utc::now();
        true
    }

    /// Get the last `max_messages` from a session's history, oldest first.
    pub fn get_history(&self, key: &str, max_messages: usize) -> Vec<Message> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let Some(session) = sessions.get(key) else {
            return Vec::new();
        };
        let len = session.messages.len();
        session.messages[len.saturating_sub(max_messages)..].to_vec()
    }

    /// Clear all messages in a session (reset conversation).
    pub fn clear(&self, key: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get_mut(key) {
            session.messages.clear();
            session.updated_at = Utc::now();
        }
    }

    /// Remove a session entirely. Returns `true` if it existed.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some();
        if removed {
            debug!(session = key, "deleted session");
        }
        removed
    }

    /// Summaries of all sessions, most recently updated first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .map(|s| SessionSummary {
                key: s.key.clone(),
                message_count: s.messages.len(),
                created_at: s.created_at,
                updated_at: s.updated_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }
}

/// Summary of a session for listing purposes.
#[derive(Clone, Debug)]
pub struct SessionSummary {
    pub key: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_add_message_preserves_order() {
        let mgr = SessionManager::new();
        mgr.add_message("cli:1", Message::user("Any Toyotas?"));
        mgr.add_message("cli:1", Message::assistant("We have a Camry."));

        assert_eq!(
            mgr.get_history("cli:1", usize::MAX),
            vec![Message::user("Any Toyotas?"), Message::assistant("We have a Camry.")]
        );
    }

    #[test]
    fn test_get_history_window() {
        let mgr = SessionManager::new();
        for i in 0..10 {
            mgr.add_message("cli:1", Message::user(format!("msg {}", i)));
        }

        let history = mgr.get_history("cli:1", 3);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "msg 7");
        assert_eq!(history[2].content, "msg 9");
    }

    #[test]
    fn test_get_history_unknown_session() {
        let mgr = SessionManager::new();
        assert!(mgr.get_history("nope", 10).is_empty());
        assert!(mgr.list_sessions().is_empty());
    }

    #[test]
    fn test_seed_if_empty() {
        let mgr = SessionManager::new();
        assert!(mgr.seed_if_empty("cli:1", Message::assistant("Hi!")));
        assert!(!mgr.seed_if_empty("cli:1", Message::assistant("Hi again!")));
        assert_eq!(mgr.get_history("cli:1", 10).len(), 1);
    }

    #[test]
    fn test_clear_session() {
        let mgr = SessionManager::new();
        mgr.add_message("cli:1", Message::user("hello"));
        mgr.clear("cli:1");
        assert!(mgr.get_history("cli:1", 10).is_empty());
        assert_eq!(mgr.list_sessions().len(), 1);
    }

    #[test]
    fn test_delete_session() {
        let mgr = SessionManager::new();
        mgr.add_message("cli:1", Message::user("hello"));
        assert!(mgr.delete("cli:1"));
        assert!(!mgr.delete("cli:1"));
        assert!(mgr.list_sessions().is_empty());
    }

    #[test]
    fn test_list_sessions() {
        let mgr = SessionManager::new();
        mgr.add_message("web:a", Message::user("a"));
        mgr.add_message("cli:b", Message::user("b"));
        mgr.add_message("cli:b", Message::user("b2"));

        let sessions = mgr.list_sessions();
        assert_eq!(sessions.len(), 2);
        let b = sessions.iter().find(|s| s.key == "cli:b").unwrap();
        assert_eq!(b.message_count, 2);
    }

    #[test]
    fn test_concurrent_appends_are_all_kept() {
        let mgr = Arc::new(SessionManager::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let mgr = mgr.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        mgr.add_message("shared", Message::user(format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(mgr.get_history("shared", 1000).len(), 200);
    }
}
