//! Registry of active listener sessions

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::SessionError;

struct SessionEntry {
    started_at: DateTime<Utc>,
    user_agent: Option<String>,
    metadata: bool,
    audio_bytes: Arc<AtomicU64>,
}

/// Snapshot of one session for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub metadata: bool,
    pub audio_bytes: u64,
}

/// Active listener sessions
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; the session ends when the guard is dropped
    pub fn register(&self, user_agent: Option<String>, metadata: bool) -> SessionGuard {
        let id = Uuid::new_v4();
        let audio_bytes = Arc::new(AtomicU64::new(0));
        self.sessions.insert(
            id,
            SessionEntry {
                started_at: Utc::now(),
                user_agent,
                metadata,
                audio_bytes: audio_bytes.clone(),
            },
        );
        tracing::info!(
            "Listener {} connected (metadata: {}, active: {})",
            id,
            metadata,
            self.sessions.len()
        );

        SessionGuard {
            id,
            audio_bytes,
            sessions: self.sessions.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Result<SessionStatus, SessionError> {
        self.sessions
            .get(&id)
            .map(|entry| snapshot(id, &entry))
            .ok_or(SessionError::NotFound(id))
    }

    /// All sessions, oldest first
    pub fn statuses(&self) -> Vec<SessionStatus> {
        let mut statuses: Vec<SessionStatus> = self
            .sessions
            .iter()
            .map(|entry| snapshot(*entry.key(), entry.value()))
            .collect();
        statuses.sort_by_key(|s| s.started_at);
        statuses
    }
}

fn snapshot(id: Uuid, entry: &SessionEntry) -> SessionStatus {
    SessionStatus {
        id,
        started_at: entry.started_at,
        user_agent: entry.user_agent.clone(),
        metadata: entry.metadata,
        audio_bytes: entry.audio_bytes.load(Ordering::Relaxed),
    }
}

/// Keeps a session registered for as long as it lives
pub struct SessionGuard {
    id: Uuid,
    audio_bytes: Arc<AtomicU64>,
    sessions: Arc<DashMap<Uuid, SessionEntry>>,
}

impl SessionGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Account audio bytes delivered to this listener
    pub fn record(&self, bytes: usize) {
        self.audio_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn audio_bytes(&self) -> u64 {
        self.audio_bytes.load(Ordering::Relaxed)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
        tracing::info!(
            "Listener {} disconnected after {} bytes (active: {})",
            self.id,
            self.audio_bytes(),
            self.sessions.len()
        );
    }
}
