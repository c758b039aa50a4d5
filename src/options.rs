use rocket::serde::Deserialize;

/// Default name of the session cookie
pub const DEFAULT_COOKIE_NAME: &str = "session_id";

/// Which [`SessionStore`](crate::storage::SessionStore) variant backs the sessions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum SessionStoreKind {
    /// Sessions live in process memory and are lost on restart
    #[default]
    #[serde(alias = "volatile")]
    Memory,
    /// Sessions are written through to an external [`SessionPersistence`](crate::storage::SessionPersistence)
    #[serde(alias = "db")]
    Durable,
}

/// Options for configuring authentication.
///
/// When not given explicitly to the fairing, these are read from the `auth` table of
/// Rocket's configuration, e.g. in `Rocket.toml`:
/// ```toml
/// [default.auth]
/// cookie_name = "_my_session_id"
/// session_duration = 3600
/// excluded_paths = ["/api/v1/status/", "/api/v1/auth_session/login/"]
/// session_store = "memory"
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(crate = "rocket::serde", default)]
pub struct AuthOptions {
    /// The name of the cookie holding the session ID (default: `"session_id"`)
    pub cookie_name: String,
    /// Session lifetime in seconds. Zero or negative means sessions never expire. (default: `0`)
    pub session_duration: i64,
    /// Path patterns that don't require authentication (default: none). A pattern ending
    /// in `*` matches any path with that prefix; otherwise the pattern matches itself
    /// and anything below it.
    pub excluded_paths: Vec<String>,
    /// Which session store to use (default: [`SessionStoreKind::Memory`])
    pub session_store: SessionStoreKind,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
            session_duration: 0,
            excluded_paths: Vec::new(),
            session_store: SessionStoreKind::default(),
        }
    }
}
