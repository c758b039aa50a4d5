use std::sync::Arc;

use bon::bon;
use rocket::http::Cookie;

use crate::{
    clock::{Clock, SystemClock},
    credential::{is_basic_scheme, CredentialCodec},
    error::{AuthFailure, AuthResult},
    expiration::ExpirationPolicy,
    identity::{Identity, IdentityStore},
    options::AuthOptions,
    path_matcher::PathMatcher,
    storage::{memory::MemoryStorage, SessionStore},
};

/// The result of authenticating a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The path is excluded from authentication; the request proceeds without a user
    Exempt,
    /// The request carried a valid credential or session for this user
    Authenticated(Identity),
    /// Authentication was required and failed
    Rejected(AuthFailure),
}

impl AuthOutcome {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthOutcome::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            AuthOutcome::Rejected(failure) => Some(*failure),
            _ => None,
        }
    }
}

/**
Decides whether a request is authenticated, and as whom, and manages the session
lifecycle (login/logout).

Requests are checked against the excluded paths first. Requests that need
authentication may carry a Basic `Authorization` header, which is verified against
the [`IdentityStore`] on every request, or a session cookie obtained from
[`login`](AuthGateway::login), which is resolved through the [`SessionStore`] (with
an [`ExpirationPolicy`] if a session duration is configured).

# Example
```
# rocket::execute(async {
use std::sync::Arc;
use rocket_session_auth::{identity::MemoryIdentityStore, AuthGateway, AuthOutcome};

let identities = MemoryIdentityStore::default();
identities.register_user("bob@x.com", "pw1").unwrap();

let gateway = AuthGateway::builder()
    .identities(Arc::new(identities))
    .with_options(|opt| opt.excluded_paths = vec!["/api/v1/status/".to_owned()])
    .build();

let session_id = gateway.login("bob@x.com", "pw1").await.unwrap();
let outcome = gateway
    .authenticate(Some("/api/v1/users/me"), None, Some(&session_id))
    .await;
assert_eq!(outcome.identity().unwrap().email, "bob@x.com");

assert_eq!(gateway.authenticate(Some("/api/v1/status"), None, None).await, AuthOutcome::Exempt);
# });
```
*/
pub struct AuthGateway {
    matcher: PathMatcher,
    codec: CredentialCodec,
    sessions: Arc<dyn SessionStore>,
    expiration: Option<ExpirationPolicy>,
    cookie_name: String,
}

#[bon]
impl AuthGateway {
    #[builder]
    pub fn new(
        /// Where users are looked up and passwords verified
        identities: Arc<dyn IdentityStore>,
        /// The session store (default: in-memory storage stamping sessions with `clock`)
        sessions: Option<Arc<dyn SessionStore>>,
        /// Set the options directly. Alternatively, use `with_options` to customize the default options via a closure.
        #[builder(default)]
        options: AuthOptions,
        /// Clock used to measure session age. A custom session store should stamp sessions with the same clock. (default: system clock)
        #[builder(default = Arc::new(SystemClock))]
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = sessions.unwrap_or_else(|| {
            Arc::new(MemoryStorage::builder().clock(clock.clone()).build())
        });
        let expiration = (options.session_duration > 0).then(|| {
            ExpirationPolicy::builder()
                .store(sessions.clone())
                .duration(options.session_duration)
                .clock(clock)
                .build()
        });
        Self {
            matcher: PathMatcher::new(&options.excluded_paths),
            codec: CredentialCodec::new(identities),
            sessions,
            expiration,
            cookie_name: options.cookie_name,
        }
    }
}

use auth_gateway_builder::{IsUnset, SetOptions, State};
impl<S: State> AuthGatewayBuilder<S> {
    /// Customize the [options](AuthOptions) via a closure. Any options that are not set will retain their default values.
    pub fn with_options<OptionsFn>(self, options_fn: OptionsFn) -> AuthGatewayBuilder<SetOptions<S>>
    where
        S::Options: IsUnset,
        OptionsFn: FnOnce(&mut AuthOptions),
    {
        let mut options = AuthOptions::default();
        options_fn(&mut options);
        self.options(options)
    }
}

impl AuthGateway {
    /// Name of the session cookie
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Whether the path requires authentication
    pub fn requires_auth(&self, path: Option<&str>) -> bool {
        self.matcher.requires_auth(path)
    }

    /// The configured session store
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Authenticate a request from its path, `Authorization` header and session cookie value.
    ///
    /// A Basic `Authorization` header takes precedence over the session cookie. A header
    /// using another scheme is only considered if there's no session cookie, in which
    /// case it's rejected as malformed.
    pub async fn authenticate(
        &self,
        path: Option<&str>,
        authorization: Option<&str>,
        session_id: Option<&str>,
    ) -> AuthOutcome {
        if !self.requires_auth(path) {
            return AuthOutcome::Exempt;
        }

        let result = match (authorization, session_id) {
            (Some(header), None) => {
                rocket::debug!("Authenticating with authorization header");
                self.codec.authenticate_header(header).await
            }
            (Some(header), Some(_)) if is_basic_scheme(header) => {
                rocket::debug!("Authenticating with basic authorization header");
                self.codec.authenticate_header(header).await
            }
            (_, Some(session_id)) => {
                rocket::debug!("Authenticating with session cookie");
                self.session_identity(session_id).await
            }
            (None, None) => Err(AuthFailure::NoCredential),
        };

        match result {
            Ok(identity) => AuthOutcome::Authenticated(identity),
            Err(failure) => {
                rocket::debug!("Authentication rejected: {failure}");
                AuthOutcome::Rejected(failure)
            }
        }
    }

    /// Verify the email and password, and create a session for the user. Returns the new session ID.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<String> {
        if email.trim().is_empty() {
            return Err(AuthFailure::EmailMissing);
        }
        if password.trim().is_empty() {
            return Err(AuthFailure::PasswordMissing);
        }
        let identity = self.codec.resolve(email, password).await?;
        let session_id = self.sessions.create(&identity.id).await.map_err(|e| {
            rocket::warn!("Session store error while creating session: {e}");
            AuthFailure::StoreUnavailable
        })?;
        rocket::info!("User '{}' logged in", identity.id);

        Ok(session_id)
    }

    /// Destroy a session. Returns `false` if there was no such session, or the store failed.
    pub async fn logout(&self, session_id: &str) -> bool {
        match self.sessions.destroy(session_id).await {
            Ok(destroyed) => destroyed,
            Err(e) => {
                rocket::warn!("Session store error while destroying session: {e}");
                false
            }
        }
    }

    /// Get the user of a live session, if any.
    pub async fn current_user(&self, session_id: &str) -> Option<Identity> {
        self.session_identity(session_id).await.ok()
    }

    /// Build the session cookie set after login.
    pub fn session_cookie(&self, session_id: &str) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), session_id.to_owned()))
            .path("/")
            .http_only(true)
            .build()
    }

    async fn session_identity(&self, session_id: &str) -> AuthResult<Identity> {
        let user_id = self
            .session_user_id(session_id)
            .await
            .ok_or(AuthFailure::InvalidOrExpiredSession)?;
        self.codec.identity_by_id(&user_id).await
    }

    async fn session_user_id(&self, session_id: &str) -> Option<String> {
        if let Some(expiration) = &self.expiration {
            return expiration.resolve(session_id).await;
        }
        match self.sessions.lookup(session_id).await {
            Ok(session) => session.map(|s| s.user_id().to_owned()),
            Err(e) => {
                rocket::warn!("Session store error while resolving session: {e}");
                None
            }
        }
    }
}
