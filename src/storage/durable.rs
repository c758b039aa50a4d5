//! Write-through session storage backed by an external persistence

use std::sync::Arc;

use rocket::async_trait;

use crate::{
    clock::{Clock, SystemClock},
    error::StoreResult,
};

use super::interface::{generate_session_id, Session, SessionFilter, SessionPersistence, SessionStore};

/// Storage provider that keeps every session in an external [`SessionPersistence`].
/// Nothing is cached: each operation is a round-trip to the persistence, and no lock
/// is held across it, so concurrency is left to the backend's own guarantees.
///
/// Session ID uniqueness relies on the 190 bits of entropy of each ID; persistence
/// backends should still declare the session ID as primary key so a collision fails
/// the write instead of overwriting a session.
pub struct DurableStorage {
    persistence: Arc<dyn SessionPersistence>,
    clock: Arc<dyn Clock>,
}

impl DurableStorage {
    pub fn new(persistence: Arc<dyn SessionPersistence>) -> Self {
        Self::with_clock(persistence, Arc::new(SystemClock))
    }

    pub fn with_clock(persistence: Arc<dyn SessionPersistence>, clock: Arc<dyn Clock>) -> Self {
        Self { persistence, clock }
    }

    async fn find(&self, session_id: &str) -> StoreResult<Option<Session>> {
        let sessions = self
            .persistence
            .search(&SessionFilter::by_session_id(session_id))
            .await?;
        Ok(sessions.into_iter().next())
    }
}

#[async_trait]
impl SessionStore for DurableStorage {
    async fn create(&self, user_id: &str) -> StoreResult<String> {
        let session = Session::new(generate_session_id(), user_id, self.clock.now());
        self.persistence.save(&session).await?;
        rocket::debug!("Saved session for user '{user_id}'");
        Ok(session.id().to_owned())
    }

    async fn lookup(&self, session_id: &str) -> StoreResult<Option<Session>> {
        self.find(session_id).await
    }

    async fn destroy(&self, session_id: &str) -> StoreResult<bool> {
        let Some(session) = self.find(session_id).await? else {
            return Ok(false);
        };
        self.persistence.remove(&session).await?;
        Ok(true)
    }

    async fn setup(&self) -> StoreResult<()> {
        self.persistence.setup().await
    }
}
