//! Error types

/// Result type for authentication decisions
pub type AuthResult<T> = Result<T, AuthFailure>;

/// Result type for session and identity store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Reasons a request or login attempt was not authenticated. These are the only
/// errors that leave the [`AuthGateway`](crate::AuthGateway).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// The `Authorization` header isn't of the form `Basic <token>`
    #[error("Malformed authorization header")]
    MalformedHeader,
    /// The token isn't canonical Base64, or doesn't decode to UTF-8 text
    #[error("Invalid credential encoding")]
    InvalidEncoding,
    /// The decoded token isn't of the form `<user>:<password>`
    #[error("Malformed credential")]
    MalformedCredential,
    /// No user exists for the given identifier
    #[error("No user found")]
    UserNotFound,
    /// The password didn't match the stored hash
    #[error("Wrong password")]
    BadPassword,
    /// The request carried neither an `Authorization` header nor a session cookie
    #[error("No credential")]
    NoCredential,
    /// The session cookie doesn't reference a live session
    #[error("Invalid or expired session")]
    InvalidOrExpiredSession,
    /// A backing store couldn't be reached
    #[error("Store unavailable")]
    StoreUnavailable,
    /// Login attempted without an email
    #[error("Email missing")]
    EmailMissing,
    /// Login attempted without a password
    #[error("Password missing")]
    PasswordMissing,
}

/// Error of the request guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// The request was not authenticated
    #[error(transparent)]
    Rejected(#[from] AuthFailure),
    /// The [`RocketSessionAuth`](crate::RocketSessionAuth) fairing isn't attached to the server
    #[error("The RocketSessionAuth fairing should be attached to the server")]
    MissingFairing,
}

/// Errors from a session or identity store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store failed or couldn't be reached. Custom storage
    /// implementations should wrap their errors in this variant.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(Box<dyn std::error::Error + Send + Sync>),
    /// A row or record couldn't be converted into a session
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
    /// Error while setting up or tearing down storage resources
    #[error("Setup/teardown error: {0}")]
    SetupTeardown(String),
}

#[cfg(feature = "sqlx_sqlite")]
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::StoreUnavailable(Box::new(e))
    }
}

impl From<StoreError> for AuthFailure {
    fn from(_: StoreError) -> Self {
        AuthFailure::StoreUnavailable
    }
}

/// Errors in the authentication configuration, reported while igniting Rocket
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The `auth` configuration table couldn't be parsed
    #[error("Invalid auth configuration: {0}")]
    Figment(#[from] rocket::figment::Error),
    /// The durable session store was selected but no persistence was provided
    #[error("Durable session store selected but no session persistence was configured")]
    MissingPersistence,
}

/// Errors while registering a user or resetting their password
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// A user with this email already exists
    #[error("User {0} already exists")]
    AlreadyExists(String),
    /// The password couldn't be hashed
    #[error("Failed to hash password: {0}")]
    Hashing(String),
    /// No user exists with this email
    #[error("No user found for {0}")]
    NotFound(String),
    /// The password reset token is unknown or was already used
    #[error("Invalid reset token")]
    InvalidResetToken,
}
