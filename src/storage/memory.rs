//! In-memory session storage implementation

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bon::Builder;
use rocket::async_trait;

use crate::{
    clock::{Clock, SystemClock},
    error::StoreResult,
};

use super::interface::{generate_session_id, Session, SessionStore};

/// In-memory storage provider for sessions. Sessions are lost when the process
/// restarts. Expired sessions are never purged here; they stay in memory until
/// destroyed, but the [`ExpirationPolicy`](crate::ExpirationPolicy) won't resolve them.
///
/// ```
/// use std::sync::Arc;
/// use rocket_session_auth::{clock::ManualClock, storage::memory::MemoryStorage};
///
/// let default_storage = MemoryStorage::default();
/// let storage = MemoryStorage::builder()
///     .clock(Arc::new(ManualClock::default()))
///     .build();
/// ```
#[derive(Builder)]
pub struct MemoryStorage {
    #[builder(skip)]
    sessions: Mutex<HashMap<String, Session>>,
    /// Clock used to stamp new sessions (default: system clock)
    #[builder(default = Arc::new(SystemClock))]
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MemoryStorage {
    /// Number of stored sessions, including expired ones that haven't been destroyed
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // every critical section is a single map operation, so a poisoned map is still consistent
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStore for MemoryStorage {
    async fn create(&self, user_id: &str) -> StoreResult<String> {
        let created_at = self.clock.now();
        let mut sessions = self.sessions();
        loop {
            if let Entry::Vacant(entry) = sessions.entry(generate_session_id()) {
                let id = entry.key().clone();
                entry.insert(Session::new(id.clone(), user_id, created_at));
                return Ok(id);
            }
        }
    }

    async fn lookup(&self, session_id: &str) -> StoreResult<Option<Session>> {
        Ok(self.sessions().get(session_id).cloned())
    }

    async fn destroy(&self, session_id: &str) -> StoreResult<bool> {
        Ok(self.sessions().remove(session_id).is_some())
    }
}
