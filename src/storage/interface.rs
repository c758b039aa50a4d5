//! Shared interface for session storage

use rand::distr::{Alphanumeric, SampleString};
use rocket::{async_trait, time::OffsetDateTime};

use crate::error::StoreResult;

/// Length of generated session IDs (alphanumeric characters, ~190 bits of entropy)
pub const SESSION_ID_LENGTH: usize = 32;

/// Generate a fresh session ID from a cryptographically secure RNG
pub fn generate_session_id() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), SESSION_ID_LENGTH)
}

/// A server-issued session, owned by a [`SessionStore`]. There are no setters:
/// a session is created once and only ever read or destroyed afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    id: String,
    user_id: String,
    created_at: OffsetDateTime,
}

impl Session {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, created_at: OffsetDateTime) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

/// Trait representing a session backend storage. You can use your own session storage
/// by implementing this trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session for the user, returning its new, unique ID.
    async fn create(&self, user_id: &str) -> StoreResult<String>;

    /// Find a session by ID. Expiration isn't checked here - see
    /// [`ExpirationPolicy`](crate::ExpirationPolicy).
    async fn lookup(&self, session_id: &str) -> StoreResult<Option<Session>>;

    /// Remove a session. Returns `true` if the session existed.
    async fn destroy(&self, session_id: &str) -> StoreResult<bool>;

    /// Optional setup of resources that will be called on server startup
    async fn setup(&self) -> StoreResult<()> {
        Ok(()) // Default no-op
    }

    /// Optional teardown of resources that will be called on server shutdown
    async fn shutdown(&self) -> StoreResult<()> {
        Ok(()) // Default no-op
    }
}

/// Fields a session search can filter on. Unset fields match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

impl SessionFilter {
    pub fn by_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Default::default()
        }
    }

    pub fn by_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, session: &Session) -> bool {
        self.session_id.as_deref().map_or(true, |id| id == session.id())
            && self.user_id.as_deref().map_or(true, |id| id == session.user_id())
    }
}

/// External persistence used by [`DurableStorage`](super::durable::DurableStorage).
/// Implement this trait to keep sessions in your own database. Any backend failure
/// should be returned as [`StoreError::StoreUnavailable`](crate::error::StoreError::StoreUnavailable).
#[async_trait]
pub trait SessionPersistence: Send + Sync {
    /// Persist a new session
    async fn save(&self, session: &Session) -> StoreResult<()>;

    /// Find all sessions matching the filter
    async fn search(&self, filter: &SessionFilter) -> StoreResult<Vec<Session>>;

    /// Remove a persisted session
    async fn remove(&self, session: &Session) -> StoreResult<()>;

    /// Optional setup (e.g. creating tables), called on server startup
    async fn setup(&self) -> StoreResult<()> {
        Ok(()) // Default no-op
    }
}
