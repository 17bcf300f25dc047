// ABOUTME: Concurrent registry of per-user conversation sessions
// ABOUTME: One exclusive lock per session serializes turn processing per user

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::types::ConversationState;

/// One user's session: the conversation state behind an async mutex, so two
/// turns for the same user can never interleave reads and writes, plus a
/// last-activity stamp for retention sweeps.
pub struct Session {
    state: Mutex<ConversationState>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl Session {
    fn new(user_id: &str) -> Self {
        Self {
            state: Mutex::new(ConversationState::new(user_id)),
            last_activity: RwLock::new(Utc::now()),
        }
    }

    /// Takes the session's exclusive turn lock.
    pub async fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().await
    }

    /// Stamps the session as active now.
    pub fn touch(&self) {
        *self.last_activity.write().unwrap() = Utc::now();
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        *self.last_activity.read().unwrap()
    }
}

/// Keyed registry of sessions, lifetime = process uptime. Unbounded by
/// itself; hosts that want retention call `prune_idle` on their own schedule.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic get-or-insert. Two calls with no intervening removal return
    /// the same session.
    pub fn get_or_create(&self, user_id: &str) -> Arc<Session> {
        let mut sessions = self.sessions.write().unwrap();
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id, "creating conversation session");
                Arc::new(Session::new(user_id))
            })
            .clone()
    }

    /// Drops a user's session so their next turn starts fresh. Returns
    /// whether a session existed.
    pub fn remove(&self, user_id: &str) -> bool {
        self.sessions.write().unwrap().remove(user_id).is_some()
    }

    /// Removes sessions idle for longer than `max_idle`. Returns the number
    /// of sessions dropped.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, session| session.last_activity() > cutoff);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().unwrap().is_empty()
    }
}
