use std::sync::Arc;

use bon::bon;
use rocket::time::Duration;

use crate::{
    clock::{Clock, SystemClock},
    error::StoreResult,
    storage::{Session, SessionStore},
};

/// Wraps a [`SessionStore`] with a time-to-live check.
///
/// A session is expired once strictly more than `duration` seconds have passed since
/// it was created: at exactly `created_at + duration` it's still valid. A duration of
/// zero or less disables expiration.
///
/// The policy should share its [`Clock`] with the store, since the store stamps
/// `created_at` and the policy measures age against it.
pub struct ExpirationPolicy {
    store: Arc<dyn SessionStore>,
    duration: i64,
    clock: Arc<dyn Clock>,
}

#[bon]
impl ExpirationPolicy {
    #[builder]
    pub fn new(
        /// The wrapped session store
        store: Arc<dyn SessionStore>,
        /// Session lifetime in seconds. Zero or negative means sessions never expire.
        #[builder(default)]
        duration: i64,
        /// Clock to measure session age with (default: system clock)
        #[builder(default = Arc::new(SystemClock))]
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            duration,
            clock,
        }
    }
}

impl ExpirationPolicy {
    /// Session lifetime in seconds
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Create a session in the wrapped store. The store stamps its creation time.
    pub async fn create(&self, user_id: &str) -> StoreResult<String> {
        self.store.create(user_id).await
    }

    /// Whether the session has outlived the configured duration
    pub fn is_expired(&self, session: &Session) -> bool {
        if self.duration <= 0 {
            return false;
        }
        let elapsed = self.clock.now() - session.created_at();
        elapsed > Duration::seconds(self.duration)
    }

    /// Get the user ID of a live session. Missing and expired sessions resolve to
    /// `None`, as do store failures (which are logged).
    pub async fn resolve(&self, session_id: &str) -> Option<String> {
        let session = match self.store.lookup(session_id).await {
            Ok(session) => session?,
            Err(e) => {
                rocket::warn!("Session store error while resolving session: {e}");
                return None;
            }
        };
        if self.is_expired(&session) {
            rocket::debug!("Session for user '{}' has expired", session.user_id());
            return None;
        }
        Some(session.user_id().to_owned())
    }
}
