//! Session table shared by every request handler
//!
//! A session id present in the table counts as authenticated. Entries are
//! added by the login path and never removed; they live as long as the
//! server. The table is a sharded concurrent map, so handlers on different
//! worker threads can save and look up ids without a global lock.

use dashmap::DashMap;
use log::debug;
use shared::SessionId;
use std::sync::Arc;
use std::time::Instant;

/// Bookkeeping for one saved session
#[derive(Debug, Clone, Copy)]
pub struct SessionEntry {
    /// When the id was first saved
    pub created_at: Instant,
    /// When the id was last saved, refreshed on every save
    pub last_saved: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            created_at: now,
            last_saved: now,
        }
    }
}

/// Cloneable handle to the set of valid session ids
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    sessions: Arc<DashMap<SessionId, SessionEntry>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the id, or refreshes it if already present
    ///
    /// Returns true when the id was not in the table before. Empty ids stand
    /// for "no session" and are never stored.
    pub fn save(&self, session_id: &SessionId) -> bool {
        if session_id.is_empty() {
            return false;
        }

        let mut inserted = false;
        self.sessions
            .entry(session_id.clone())
            .and_modify(|entry| {
                entry.last_saved = Instant::now();
                debug!(
                    "Session {} refreshed, {:?} after it was created",
                    session_id,
                    entry.created_at.elapsed()
                );
            })
            .or_insert_with(|| {
                inserted = true;
                SessionEntry::new()
            });

        if inserted {
            debug!("Session {} saved", session_id);
        }
        inserted
    }

    pub fn has(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn get(&self, session_id: &SessionId) -> Option<SessionEntry> {
        self.sessions.get(session_id).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
