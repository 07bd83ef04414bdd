//! Per-session conversation memory.
//!
//! Histories are keyed by an opaque session id and handed to the RAG engine
//! explicitly on every call. Only ids issued by [`SessionStore::create`] and
//! the shared [`DEFAULT_SESSION`] are known; the number of issued sessions is
//! capped and the least recently used one is evicted first.

use crate::llm::ConversationTurn;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Session used when a request carries no known session id.
pub const DEFAULT_SESSION: &str = "default";

/// Default cap on issued sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Ordered turns of one conversation.
pub type ConversationHistory = Vec<ConversationTurn>;

struct Session {
    history: ConversationHistory,
    last_seen: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            history: ConversationHistory::new(),
            last_seen: Instant::now(),
        }
    }
}

/// In-memory store of conversation histories.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    max_messages: usize,
    max_sessions: usize,
}

impl SessionStore {
    /// Create a store keeping at most `max_messages` per session (0 = unbounded).
    pub fn new(max_messages: usize) -> Self {
        let mut sessions = HashMap::new();
        sessions.insert(DEFAULT_SESSION.to_string(), Session::new());
        Self {
            sessions: RwLock::new(sessions),
            max_messages,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// Cap the number of issued sessions (0 = unbounded). The default session
    /// is not counted and never evicted.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Start a new, empty session and return its id.
    pub async fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        self.evict_for_insert(&mut sessions);
        sessions.insert(id.clone(), Session::new());
        debug!("Created session {}", id);
        id
    }

    /// Drop least recently used sessions until one more fits under the cap.
    fn evict_for_insert(&self, sessions: &mut HashMap<String, Session>) {
        if self.max_sessions == 0 {
            return;
        }
        while sessions.len().saturating_sub(1) >= self.max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(id, _)| id.as_str() != DEFAULT_SESSION)
                .min_by_key(|(_, s)| s.last_seen)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!("Evicted session {}", id);
                }
                None => break,
            }
        }
    }

    /// Whether a session with this id exists.
    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Snapshot of a session's history. Unknown sessions have an empty history.
    pub async fn history(&self, id: &str) -> ConversationHistory {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) => {
                session.last_seen = Instant::now();
                session.history.clone()
            }
            None => ConversationHistory::new(),
        }
    }

    /// Append a question and its answer to a known session, trimming the
    /// oldest turns. Returns false, recording nothing, for an unknown id.
    pub async fn record_exchange(&self, id: &str, question: &str, answer: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(id) else {
            debug!("Ignoring exchange for unknown session {}", id);
            return false;
        };
        session.last_seen = Instant::now();

        let history = &mut session.history;
        history.push(ConversationTurn::user(question));
        history.push(ConversationTurn::assistant(answer));

        if self.max_messages > 0 && history.len() > self.max_messages {
            let mut excess = history.len() - self.max_messages;
            // drop whole exchanges so the history still starts with a user turn
            if excess % 2 == 1 {
                excess += 1;
            }
            history.drain(..excess.min(history.len()));
        }
        true
    }

    /// Clear a known session's history, keeping the session itself.
    pub async fn reset(&self, id: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.history.clear();
            session.last_seen = Instant::now();
            debug!("Reset session {}", id);
        }
    }

    /// Number of known sessions, the default one included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions exist. Always false: the default session is permanent.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(20)
    }
}
