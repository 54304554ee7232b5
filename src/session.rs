// 🔐 Session Store
// One isolated, in-memory analysis per upload. Nothing is persisted.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

use crate::analysis::Analysis;
use crate::error::{AnalyzerError, Result};

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub analysis: Arc<Analysis>,
}

impl Session {
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }
}

/// Bounded map of live sessions; the oldest session is evicted when full.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<Uuid, Session>,
    order: VecDeque<Uuid>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        SessionStore {
            sessions: HashMap::new(),
            order: VecDeque::new(),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Store a fresh analysis under a new random id.
    pub fn create(&mut self, analysis: Analysis) -> Uuid {
        while self.sessions.len() >= self.max_sessions {
            match self.order.pop_front() {
                Some(oldest) => {
                    if let Some(evicted) = self.sessions.remove(&oldest) {
                        tracing::info!(
                            session = %evicted.id,
                            created_at = %evicted.created_at,
                            age_secs = evicted.age().num_seconds(),
                            "evicted oldest session"
                        );
                    }
                }
                None => break,
            }
        }

        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            Session {
                id,
                created_at: Utc::now(),
                analysis: Arc::new(analysis),
            },
        );
        self.order.push_back(id);
        tracing::info!(session = %id, live = self.sessions.len(), "session created");
        id
    }

    pub fn get(&self, id: &Uuid) -> Result<&Session> {
        self.sessions
            .get(id)
            .ok_or_else(|| AnalyzerError::SessionNotFound(id.to_string()))
    }

    /// Lookup by the textual id used in URLs
    pub fn get_by_str(&self, id: &str) -> Result<&Session> {
        let uuid = parse_session_id(id)?;
        self.get(&uuid)
    }

    /// Discard a session. Returns false when it did not exist.
    pub fn remove(&mut self, id: &Uuid) -> bool {
        self.order.retain(|s| s != id);
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "session discarded");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

pub fn parse_session_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| AnalyzerError::SessionNotFound(id.to_string()))
}
