//! HTTP Basic credential decoding and verification

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    error::{AuthFailure, AuthResult},
    identity::{Identity, IdentityFilter, IdentityStore},
};

/// Scheme prefix of a Basic `Authorization` header
const BASIC_SCHEME: &str = "Basic ";

/// A not-yet-verified user/password pair, decoded from a Basic `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    user: String,
    password: String,
}

impl Credential {
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Whether the header uses the Basic scheme (regardless of whether it's well-formed)
pub(crate) fn is_basic_scheme(header_value: &str) -> bool {
    header_value
        .trim()
        .strip_prefix(BASIC_SCHEME.trim_end())
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Decodes Basic credentials and resolves them to an [`Identity`] using an [`IdentityStore`].
#[derive(Clone)]
pub struct CredentialCodec {
    identities: Arc<dyn IdentityStore>,
}

impl CredentialCodec {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    /// Decode an `Authorization` header value of the form `Basic base64(user:password)`.
    ///
    /// ```
    /// use rocket_session_auth::{AuthFailure, CredentialCodec};
    ///
    /// let credential = CredentialCodec::decode("Basic Ym9iQHguY29tOnB3MQ==").unwrap();
    /// assert_eq!(credential.user(), "bob@x.com");
    /// assert_eq!(credential.password(), "pw1");
    ///
    /// assert_eq!(CredentialCodec::decode("Bearer abc"), Err(AuthFailure::MalformedHeader));
    /// assert_eq!(CredentialCodec::decode("Basic Ym9i!"), Err(AuthFailure::InvalidEncoding));
    /// ```
    pub fn decode(header_value: &str) -> AuthResult<Credential> {
        let token = header_value
            .trim()
            .strip_prefix(BASIC_SCHEME)
            .filter(|token| !token.is_empty())
            .ok_or(AuthFailure::MalformedHeader)?;

        let bytes = STANDARD
            .decode(token)
            .map_err(|_| AuthFailure::InvalidEncoding)?;
        let text = String::from_utf8(bytes).map_err(|_| AuthFailure::InvalidEncoding)?;

        let (user, password) = text
            .trim()
            .split_once(':')
            .filter(|(user, password)| !user.is_empty() && !password.is_empty())
            .ok_or(AuthFailure::MalformedCredential)?;

        Ok(Credential {
            user: user.to_owned(),
            password: password.to_owned(),
        })
    }

    /// Look up the user by email and verify the password. If the store holds several
    /// users with the same email, the first one in store order is checked.
    pub async fn resolve(&self, user: &str, password: &str) -> AuthResult<Identity> {
        let records = self
            .identities
            .search(&IdentityFilter::by_email(user))
            .await
            .map_err(|e| {
                rocket::warn!("Identity store error while resolving credentials: {e}");
                AuthFailure::StoreUnavailable
            })?;
        let record = records.into_iter().next().ok_or(AuthFailure::UserNotFound)?;
        if !self.identities.verify_password(&record, password) {
            rocket::debug!("Wrong password for user '{}'", record.identity().id);
            return Err(AuthFailure::BadPassword);
        }

        Ok(record.into_identity())
    }

    /// Decode the header, then resolve the credential.
    pub async fn authenticate_header(&self, header_value: &str) -> AuthResult<Identity> {
        let credential = Self::decode(header_value)?;
        self.resolve(&credential.user, &credential.password).await
    }

    /// Look up a user by ID.
    pub(crate) async fn identity_by_id(&self, user_id: &str) -> AuthResult<Identity> {
        let records = self
            .identities
            .search(&IdentityFilter::by_id(user_id))
            .await
            .map_err(|e| {
                rocket::warn!("Identity store error while loading user '{user_id}': {e}");
                AuthFailure::StoreUnavailable
            })?;
        records
            .into_iter()
            .next()
            .map(|r| r.into_identity())
            .ok_or(AuthFailure::UserNotFound)
    }
}
