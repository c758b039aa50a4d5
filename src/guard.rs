use rocket::{
    http::{Cookie, CookieJar, Status},
    outcome::try_outcome,
    request::{FromRequest, Outcome},
    Request,
};

use crate::{
    error::{AuthFailure, AuthResult, GuardError},
    identity::Identity,
    AuthGateway, AuthOutcome,
};

/// Type of the cached auth outcome in Rocket's request local cache. `None` if the
/// gateway isn't in managed state.
struct LocalCachedOutcome(Option<AuthOutcome>);

/// Runs the [`AuthGateway`] decision for the request. The decision is made once per
/// request and cached, so this guard can be used any number of times. It fails only
/// if the [`RocketSessionAuth`](crate::RocketSessionAuth) fairing isn't attached.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r AuthOutcome {
    type Error = GuardError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let LocalCachedOutcome(outcome) = req
            .local_cache_async(async {
                let outcome = match req.rocket().state::<AuthGateway>() {
                    Some(gateway) => Some(authenticate_request(gateway, req).await),
                    None => None,
                };
                LocalCachedOutcome(outcome)
            })
            .await;

        match outcome {
            Some(outcome) => Outcome::Success(outcome),
            None => missing_fairing(),
        }
    }
}

fn missing_fairing<T>() -> Outcome<T, GuardError> {
    rocket::error!("{}", GuardError::MissingFairing);
    Outcome::Error((Status::InternalServerError, GuardError::MissingFairing))
}

/// Authenticate the request from its path, `Authorization` header and session cookie
async fn authenticate_request(gateway: &AuthGateway, req: &Request<'_>) -> AuthOutcome {
    let path = req.uri().path();
    let authorization = req.headers().get_one("Authorization");
    let session_cookie = req.cookies().get(gateway.cookie_name());
    gateway
        .authenticate(
            Some(path.as_str()),
            authorization,
            session_cookie.map(|c| c.value()),
        )
        .await
}

/**
Request guard for the authenticated user. Fails with `401 Unauthorized` if the request
carried no credential at all, and `403 Forbidden` if the credential or session was
rejected, with the [`AuthFailure`] as [`GuardError::Rejected`]. On excluded paths there's
no user to return, so the guard forwards.

# Example
```rust
use rocket_session_auth::CurrentUser;

#[rocket::get("/users/me")]
fn me(user: CurrentUser) -> String {
    format!("Logged in as {}", user.0.email)
}
```
*/
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Identity);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = GuardError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match try_outcome!(req.guard::<&AuthOutcome>().await) {
            AuthOutcome::Authenticated(identity) => Outcome::Success(CurrentUser(identity.clone())),
            AuthOutcome::Exempt => Outcome::Forward(Status::Unauthorized),
            AuthOutcome::Rejected(AuthFailure::NoCredential) => {
                Outcome::Error((Status::Unauthorized, AuthFailure::NoCredential.into()))
            }
            AuthOutcome::Rejected(failure) => Outcome::Error((Status::Forbidden, (*failure).into())),
        }
    }
}

/**
Request guard to log in and out with a session cookie.

# Example
```rust
use rocket::{form::Form, http::Status};
use rocket_session_auth::{AuthFailure, AuthSession};

#[derive(rocket::FromForm)]
struct Login {
    email: String,
    password: String,
}

#[rocket::post("/auth_session/login", data = "<form>")]
async fn login(session: AuthSession<'_>, form: Form<Login>) -> Result<&'static str, Status> {
    match session.login(&form.email, &form.password).await {
        Ok(_) => Ok("Logged in"),
        Err(AuthFailure::UserNotFound) => Err(Status::NotFound),
        Err(_) => Err(Status::Unauthorized),
    }
}

#[rocket::delete("/auth_session/logout")]
async fn logout(session: AuthSession<'_>) -> Status {
    if session.logout().await { Status::Ok } else { Status::NotFound }
}
```
*/
pub struct AuthSession<'a> {
    gateway: &'a AuthGateway,
    cookie_jar: &'a CookieJar<'a>,
}

impl AuthSession<'_> {
    /// The session ID from the request's session cookie, if any
    pub fn id(&self) -> Option<String> {
        self.cookie_jar
            .get(self.gateway.cookie_name())
            .map(|c| c.value().to_owned())
    }

    /// Verify the email and password, create a session and set the session cookie.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<String> {
        let session_id = self.gateway.login(email, password).await?;
        self.cookie_jar.add(self.gateway.session_cookie(&session_id));
        Ok(session_id)
    }

    /// Destroy the current session and remove the session cookie. Returns `false` if
    /// there was no session to destroy.
    pub async fn logout(&self) -> bool {
        let Some(session_id) = self.id() else {
            return false;
        };
        let destroyed = self.gateway.logout(&session_id).await;
        self.cookie_jar
            .remove(Cookie::build(self.gateway.cookie_name().to_owned()).path("/"));
        destroyed
    }

    /// The user of the current session, if it's live
    pub async fn current_user(&self) -> Option<Identity> {
        let session_id = self.id()?;
        self.gateway.current_user(&session_id).await
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthSession<'r> {
    type Error = GuardError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.rocket().state::<AuthGateway>() {
            Some(gateway) => Outcome::Success(AuthSession {
                gateway,
                cookie_jar: req.cookies(),
            }),
            None => missing_fairing(),
        }
    }
}
