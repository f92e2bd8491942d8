//! Session persistence trait and an in-process reference implementation.
//!
//! Mirrors the original system's sessions table: upsert the whole session
//! snapshot, append rounds to a separate history log, and on load demote
//! any session still marked `running` back to `waiting` — a crash or
//! restart cannot have left a session genuinely mid-round.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::EngineError;
use crate::session::state::{Session, SessionStatus};
use crate::types::HistoryItem;

/// Persistence seam for a running `Session`. Implementations may back this
/// with a file, a database, or (as here) nothing but process memory.
pub trait SessionStore: Send + Sync {
    fn upsert(&self, session: &Session) -> Result<(), EngineError>;
    fn append_history(&self, session_id: &str, item: &HistoryItem) -> Result<(), EngineError>;
    /// Load every persisted session snapshot, downgrading any still
    /// recorded as `Running` to `Waiting` — a restart always finds rounds
    /// incomplete.
    fn load_all(&self) -> Result<Vec<SessionSnapshot>, EngineError>;
}

/// A persisted session's durable fields, independent of the live
/// `Session` struct's in-memory bookkeeping (pending vote pools, buffers).
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub id: String,
    pub status: SessionStatus,
    pub current_view: u64,
    pub current_round: u32,
    pub history: Vec<HistoryItem>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            status: session.status,
            current_view: session.current_view,
            current_round: session.current_round,
            history: session.consensus_history.clone(),
        }
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    sessions: RwLock<HashMap<String, SessionSnapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemoryStore {
    fn upsert(&self, session: &Session) -> Result<(), EngineError> {
        let snapshot = SessionSnapshot::from(session);
        self.sessions.write().insert(snapshot.id.clone(), snapshot);
        Ok(())
    }

    fn append_history(&self, session_id: &str, item: &HistoryItem) -> Result<(), EngineError> {
        let mut guard = self.sessions.write();
        let snapshot = guard
            .get_mut(session_id)
            .ok_or_else(|| EngineError::UnknownSession(session_id.to_string()))?;
        snapshot.history.push(item.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SessionSnapshot>, EngineError> {
        let mut guard = self.sessions.write();
        for snapshot in guard.values_mut() {
            if snapshot.status == SessionStatus::Running {
                snapshot.status = SessionStatus::Waiting;
            }
        }
        Ok(guard.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionConfig;

    #[test]
    fn load_all_downgrades_running_sessions_to_waiting() {
        let store = InMemoryStore::new();
        let mut session = Session::new("s1".into(), SessionConfig::default());
        session.status = SessionStatus::Running;
        store.upsert(&session).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].status, SessionStatus::Waiting);
    }

    #[test]
    fn append_history_on_unknown_session_errors() {
        let store = InMemoryStore::new();
        let item = HistoryItem {
            round: 0,
            view: 0,
            status: "x".into(),
            description: "x".into(),
            stats: crate::types::ConsensusStats {
                expected_nodes: 0,
                expected_prepare_nodes: 0,
                total_messages: 0,
                complexity_comparison: crate::types::ComplexityComparison {
                    double_hotstuff: zero_stats(),
                    pbft_pure: zero_stats(),
                    hotstuff_pure: zero_stats(),
                    pbft_multi_layer: zero_stats(),
                },
                network_stats: crate::types::NetworkStatsSummary {
                    actual_messages: 0,
                    node_count: 0,
                    branch_count: 0,
                },
            },
            timestamp: chrono::Utc::now(),
        };
        assert!(store.append_history("missing", &item).is_err());
    }

    fn zero_stats() -> crate::types::AlgorithmStats {
        crate::types::AlgorithmStats {
            name: "x".into(),
            theoretical: 0.0,
            actual: 0.0,
            complexity: "O(1)".into(),
            is_current: false,
            optimization_ratio: None,
        }
    }
}
