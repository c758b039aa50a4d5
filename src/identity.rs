//! Users, the identity store interface, and password hashing

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError, RwLock},
};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use rocket::{async_trait, serde::Serialize};

use crate::error::{RegistrationError, StoreResult};

/// An authenticated user. Never carries password material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// A stored user: the identity plus its password hash (an Argon2 PHC string).
#[derive(Clone)]
pub struct UserRecord {
    identity: Identity,
    password_hash: String,
}

impl UserRecord {
    pub fn new(identity: Identity, password_hash: impl Into<String>) -> Self {
        Self {
            identity,
            password_hash: password_hash.into(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn into_identity(self) -> Identity {
        self.identity
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Fields an identity search can filter on. Unset fields match anything, so the
/// default filter matches every user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityFilter {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl IdentityFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, identity: &Identity) -> bool {
        self.id.as_ref().map_or(true, |id| *id == identity.id)
            && self.email.as_ref().map_or(true, |e| *e == identity.email)
    }
}

/// Where users and their password hashes are looked up. Implement this trait to
/// authenticate against your own user database.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Find all users matching the filter, in store order. Matching is exact.
    async fn search(&self, filter: &IdentityFilter) -> StoreResult<Vec<UserRecord>>;

    /// Check a plaintext password against the user's stored hash. The default
    /// implementation verifies Argon2 PHC strings.
    fn verify_password(&self, record: &UserRecord, password: &str) -> bool {
        verify_password(record.password_hash(), password)
    }
}

/// Hash a password with Argon2id and a random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, RegistrationError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| RegistrationError::Hashing(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| RegistrationError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC string. An unparseable hash never verifies.
pub fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// In-memory identity store. Records are kept in insertion order, which is the
/// order [`search`](IdentityStore::search) returns them in.
///
/// ```
/// # rocket::execute(async {
/// use rocket_session_auth::identity::{IdentityFilter, IdentityStore, MemoryIdentityStore};
///
/// let store = MemoryIdentityStore::default();
/// let bob = store.register_user("bob@x.com", "pw1").unwrap();
/// let found = store.search(&IdentityFilter::by_email("bob@x.com")).await.unwrap();
/// assert_eq!(found[0].identity(), &bob);
/// # });
/// ```
#[derive(Default)]
pub struct MemoryIdentityStore {
    records: RwLock<Vec<UserRecord>>,
    /// Outstanding password reset tokens, mapped to user IDs
    reset_tokens: Mutex<HashMap<String, String>>,
}

impl MemoryIdentityStore {
    /// Register a new user with a hashed password and a fresh UUID.
    pub fn register_user(&self, email: &str, password: &str) -> Result<Identity, RegistrationError> {
        let password_hash = hash_password(password)?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.iter().any(|r| r.identity.email == email) {
            return Err(RegistrationError::AlreadyExists(email.to_owned()));
        }
        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_owned(),
        };
        records.push(UserRecord::new(identity.clone(), password_hash));
        rocket::info!("Registered user '{}'", identity.id);
        Ok(identity)
    }

    /// Insert an existing record as-is. Duplicate emails are allowed here, in which
    /// case lookups by email resolve to the earliest record.
    pub fn insert_record(&self, record: UserRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Issue a single-use token for resetting the user's password.
    pub fn get_reset_password_token(&self, email: &str) -> Result<String, RegistrationError> {
        let user_id = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.identity.email == email)
            .map(|r| r.identity.id.clone())
            .ok_or_else(|| RegistrationError::NotFound(email.to_owned()))?;
        let token = uuid::Uuid::new_v4().to_string();
        self.reset_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), user_id);
        Ok(token)
    }

    /// Set a new password using a token from [`get_reset_password_token`](Self::get_reset_password_token).
    /// The token is consumed.
    pub fn update_password(&self, reset_token: &str, password: &str) -> Result<(), RegistrationError> {
        let user_id = self
            .reset_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(reset_token)
            .ok_or(RegistrationError::InvalidResetToken)?;
        let password_hash = hash_password(password)?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .iter_mut()
            .find(|r| r.identity.id == user_id)
            .ok_or(RegistrationError::InvalidResetToken)?;
        record.password_hash = password_hash;
        rocket::info!("Password updated for user '{user_id}'");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn search(&self, filter: &IdentityFilter) -> StoreResult<Vec<UserRecord>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .iter()
            .filter(|r| filter.matches(&r.identity))
            .cloned()
            .collect())
    }
}
