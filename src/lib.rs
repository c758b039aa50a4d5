#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

/*!
# Overview
Basic and session authentication for Rocket applications.

- Requests are authenticated either with an HTTP Basic `Authorization` header,
  verified against your user store on every request, or with a session cookie
  issued at login.
- Paths can be excluded from authentication with simple prefix/wildcard rules.
- Sessions can be given a lifetime, after which they no longer authenticate.
- Sessions are kept in memory, or written through to a durable store of your
  choice by implementing the [`SessionPersistence`](crate::storage::SessionPersistence) trait.
  A SQLite implementation is available with the `sqlx_sqlite` feature.
- The core [`AuthGateway`] doesn't depend on Rocket's request types, so it can be used
  and tested on its own.

# Usage

## Basic setup

```rust
use std::sync::Arc;
use rocket::routes;
use rocket_session_auth::{identity::MemoryIdentityStore, CurrentUser, RocketSessionAuth};

#[rocket::launch]
fn rocket() -> _ {
    let identities = MemoryIdentityStore::default();
    identities.register_user("bob@x.com", "pw1").expect("should register user");

    rocket::build()
        // attach the `RocketSessionAuth` fairing, passing in your user store
        .attach(
            RocketSessionAuth::builder()
                .identities(Arc::new(identities))
                .with_options(|opt| opt.excluded_paths = vec!["/api/v1/status/".to_owned()])
                .build(),
        )
        .mount("/api/v1", routes![me])
}

// use the `CurrentUser` request guard in a route handler
#[rocket::get("/users/me")]
fn me(user: CurrentUser) -> String {
    user.0.email
}
```

## Request guards

- [`CurrentUser`] succeeds with the authenticated [`Identity`](crate::identity::Identity).
  It fails with `401 Unauthorized` if the request had neither an `Authorization` header nor
  a session cookie, and with `403 Forbidden` if the credential or session was rejected.
- [`AuthSession`] logs users in (setting the session cookie) and out.
- `&AuthOutcome` gives the raw decision, including whether the path was exempt and why
  a request was rejected.

## Configuration

Options can be set with the fairing's builder, or read from the `auth` table of
Rocket's configuration:

```toml
[default.auth]
cookie_name = "_my_session_id"
session_duration = 3600       # seconds; 0 means sessions never expire
excluded_paths = ["/api/v1/status/", "/api/v1/auth_session/login/"]
session_store = "durable"     # or "memory"
```

The durable store requires a persistence, passed to the fairing's builder.

## Custom user store

Implement [`IdentityStore`](crate::identity::IdentityStore) to look users up in your own
database:

```rust
use rocket::async_trait;
use rocket_session_auth::{
    error::StoreResult,
    identity::{IdentityFilter, IdentityStore, UserRecord},
};

pub struct MyUserStore {}

#[async_trait]
impl IdentityStore for MyUserStore {
    async fn search(&self, filter: &IdentityFilter) -> StoreResult<Vec<UserRecord>> {
        // Query users by `filter.id` and/or `filter.email`
        todo!()
    }
}
```

# Feature flags

| Name    | Description    |
|---------|----------------|
| `sqlx_sqlite`  | Session persistence in SQLite, using the [sqlx](https://docs.rs/crate/sqlx) crate. |
*/

mod expiration;
mod fairing;
mod gateway;
mod guard;
mod options;

pub mod clock;
pub mod credential;
pub mod error;
pub mod identity;
pub mod path_matcher;
pub mod storage;

pub use credential::{Credential, CredentialCodec};
pub use error::AuthFailure;
pub use expiration::{ExpirationPolicy, ExpirationPolicyBuilder};
pub use fairing::{RocketSessionAuth, RocketSessionAuthBuilder};
pub use gateway::{AuthGateway, AuthGatewayBuilder, AuthOutcome};
pub use guard::{AuthSession, CurrentUser};
pub use options::{AuthOptions, SessionStoreKind, DEFAULT_COOKIE_NAME};
pub use path_matcher::{requires_auth, ExclusionRule, PathMatcher};
