mod common;

#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::{
    form::Form,
    http::{ContentType, Cookie, Header, Status},
    local::blocking::Client,
    Build, Rocket,
};
use rocket_session_auth::{
    error::GuardError, identity::MemoryIdentityStore, AuthFailure, AuthOutcome, AuthSession, CurrentUser,
    RocketSessionAuth, DEFAULT_COOKIE_NAME,
};

use crate::common::{basic_header, seeded_identities, FakePersistence, BOB_EMAIL, BOB_PASSWORD};

#[derive(FromForm)]
struct Login {
    email: String,
    password: String,
}

#[get("/status")]
fn status(outcome: &AuthOutcome) -> &'static str {
    match outcome {
        AuthOutcome::Exempt => "OK (exempt)",
        _ => "OK",
    }
}

#[get("/users/me")]
fn me(user: CurrentUser) -> String {
    format!("Logged in as {}", user.0.email)
}

#[get("/users/me/check")]
fn me_check(user: Result<CurrentUser, GuardError>) -> String {
    match user {
        Ok(user) => format!("Logged in as {}", user.0.email),
        Err(e) => e.to_string(),
    }
}

#[post("/auth_session/login", data = "<form>")]
async fn login(session: AuthSession<'_>, form: Form<Login>) -> Result<&'static str, Status> {
    match session.login(&form.email, &form.password).await {
        Ok(_) => Ok("Logged in"),
        Err(AuthFailure::EmailMissing | AuthFailure::PasswordMissing) => Err(Status::BadRequest),
        Err(AuthFailure::UserNotFound) => Err(Status::NotFound),
        Err(AuthFailure::StoreUnavailable) => Err(Status::ServiceUnavailable),
        Err(_) => Err(Status::Unauthorized),
    }
}

#[delete("/auth_session/logout")]
async fn logout(session: AuthSession<'_>) -> Status {
    if session.logout().await {
        Status::Ok
    } else {
        Status::NotFound
    }
}

fn create_rocket(rocket: Rocket<Build>, identities: Arc<MemoryIdentityStore>) -> Rocket<Build> {
    rocket
        .attach(
            RocketSessionAuth::builder()
                .identities(identities)
                .with_options(|opt| {
                    opt.excluded_paths = vec![
                        "/api/v1/status/".to_owned(),
                        "/api/v1/auth_session/login/".to_owned(),
                    ]
                })
                .build(),
        )
        .mount("/api/v1", routes![status, me, me_check, login, logout])
}

fn login_body(email: &str, password: &str) -> String {
    let encode = |value: &str| value.replace('@', "%40").replace(' ', "+");
    format!("email={}&password={}", encode(email), encode(password))
}

#[test]
fn test_no_credential_is_unauthorized() {
    let (identities, _, _) = seeded_identities();
    let client = Client::tracked(create_rocket(rocket::build(), identities)).unwrap();

    let response = client.get("/api/v1/users/me").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn test_excluded_path() {
    let (identities, _, _) = seeded_identities();
    let client = Client::tracked(create_rocket(rocket::build(), identities)).unwrap();

    let response = client.get("/api/v1/status").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string(), Some("OK (exempt)".into()));
}

#[test]
fn test_basic_header() {
    let (identities, _, _) = seeded_identities();
    let client = Client::tracked(create_rocket(rocket::build(), identities)).unwrap();

    let response = client
        .get("/api/v1/users/me")
        .header(Header::new("Authorization", basic_header(BOB_EMAIL, BOB_PASSWORD)))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string(), Some(format!("Logged in as {BOB_EMAIL}")));

    let response = client
        .get("/api/v1/users/me")
        .header(Header::new("Authorization", basic_header(BOB_EMAIL, "wrong")))
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .get("/api/v1/users/me")
        .header(Header::new("Authorization", "Basic !!!!"))
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);
}

#[test]
fn test_login_logout_flow() {
    let (identities, _, _) = seeded_identities();
    let client = Client::tracked(create_rocket(rocket::build(), identities)).unwrap();

    // Login sets the session cookie
    let response = client
        .post("/api/v1/auth_session/login")
        .header(ContentType::Form)
        .body(login_body(BOB_EMAIL, BOB_PASSWORD))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let cookie = response
        .cookies()
        .get(DEFAULT_COOKIE_NAME)
        .expect("should set session cookie");
    assert!(!cookie.value().is_empty());

    // The tracked client sends the cookie back
    let response = client.get("/api/v1/users/me").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string(), Some(format!("Logged in as {BOB_EMAIL}")));

    // Logout destroys the session and removes the cookie
    let response = client.delete("/api/v1/auth_session/logout").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        client.get("/api/v1/users/me").dispatch().status(),
        Status::Unauthorized
    );
    assert_eq!(
        client.delete("/api/v1/auth_session/logout").dispatch().status(),
        Status::NotFound
    );
}

#[test]
fn test_stale_session_cookie_is_forbidden() {
    let (identities, _, _) = seeded_identities();
    let client = Client::tracked(create_rocket(rocket::build(), identities)).unwrap();

    let response = client
        .get("/api/v1/users/me")
        .cookie(Cookie::new(DEFAULT_COOKIE_NAME, "does-not-exist"))
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);
}

#[test]
fn test_login_failures() {
    let (identities, _, _) = seeded_identities();
    let client = Client::tracked(create_rocket(rocket::build(), identities)).unwrap();

    let cases = [
        ("", BOB_PASSWORD, Status::BadRequest),
        (BOB_EMAIL, " ", Status::BadRequest),
        ("nobody@x.com", BOB_PASSWORD, Status::NotFound),
        (BOB_EMAIL, "wrong", Status::Unauthorized),
    ];
    for (email, password, status) in cases {
        let response = client
            .post("/api/v1/auth_session/login")
            .header(ContentType::Form)
            .body(login_body(email, password))
            .dispatch();
        assert_eq!(response.status(), status, "login as '{email}'");
        assert!(response.cookies().get(DEFAULT_COOKIE_NAME).is_none());
    }
}

#[test]
fn test_options_from_rocket_config() {
    let (identities, _, _) = seeded_identities();
    let figment = rocket::Config::figment()
        .merge(("auth.cookie_name", "_test_session"))
        .merge(("auth.session_duration", 3600));
    let rocket = rocket::custom(figment)
        .attach(RocketSessionAuth::builder().identities(identities).build())
        .mount("/api/v1", routes![status, me, login]);
    let client = Client::tracked(rocket).unwrap();

    // no exclusions configured, so the status route isn't exempt
    let response = client.get("/api/v1/status").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string(), Some("OK".into()));

    let response = client
        .post("/api/v1/auth_session/login")
        .header(ContentType::Form)
        .body(login_body(BOB_EMAIL, BOB_PASSWORD))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert!(response.cookies().get("_test_session").is_some());
    assert!(response.cookies().get(DEFAULT_COOKIE_NAME).is_none());

    assert_eq!(client.get("/api/v1/users/me").dispatch().status(), Status::Ok);
}

#[test]
fn test_durable_store_from_rocket_config() {
    let (identities, _, _) = seeded_identities();
    let persistence = Arc::new(FakePersistence::default());
    let figment = rocket::Config::figment().merge(("auth.session_store", "durable"));
    let rocket = rocket::custom(figment)
        .attach(
            RocketSessionAuth::builder()
                .identities(identities)
                .persistence(persistence.clone())
                .build(),
        )
        .mount("/api/v1", routes![me, login]);
    let client = Client::tracked(rocket).unwrap();

    let response = client
        .post("/api/v1/auth_session/login")
        .header(ContentType::Form)
        .body(login_body(BOB_EMAIL, BOB_PASSWORD))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(persistence.len(), 1);

    persistence.set_offline(true);
    assert_eq!(client.get("/api/v1/users/me").dispatch().status(), Status::Forbidden);
    let response = client
        .post("/api/v1/auth_session/login")
        .header(ContentType::Form)
        .body(login_body(BOB_EMAIL, BOB_PASSWORD))
        .dispatch();
    assert_eq!(response.status(), Status::ServiceUnavailable);
}

#[test]
fn test_durable_store_without_persistence_fails_ignite() {
    let (identities, _, _) = seeded_identities();
    let figment = rocket::Config::figment().merge(("auth.session_store", "durable"));
    let rocket = rocket::custom(figment)
        .attach(RocketSessionAuth::builder().identities(identities).build())
        .mount("/api/v1", routes![me]);
    assert!(Client::tracked(rocket).is_err());
}

#[test]
fn test_invalid_config_fails_ignite() {
    let (identities, _, _) = seeded_identities();
    let figment = rocket::Config::figment().merge(("auth.session_store", "redis"));
    let rocket = rocket::custom(figment)
        .attach(RocketSessionAuth::builder().identities(identities).build())
        .mount("/api/v1", routes![me]);
    assert!(Client::tracked(rocket).is_err());
}

#[test]
fn test_missing_fairing() {
    let rocket = rocket::build().mount("/api/v1", routes![me, me_check, logout]);
    let client = Client::tracked(rocket).unwrap();

    let response = client.get("/api/v1/users/me").dispatch();
    assert_eq!(response.status(), Status::InternalServerError);
    let response = client.delete("/api/v1/auth_session/logout").dispatch();
    assert_eq!(response.status(), Status::InternalServerError);

    // the guard error names the missing fairing rather than a store failure
    let response = client.get("/api/v1/users/me/check").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.into_string(),
        Some(GuardError::MissingFairing.to_string())
    );
}

#[test]
fn test_guard_error_carries_auth_failure() {
    let (identities, _, _) = seeded_identities();
    let client = Client::tracked(create_rocket(rocket::build(), identities)).unwrap();

    let response = client.get("/api/v1/users/me/check").dispatch();
    assert_eq!(
        response.into_string(),
        Some(GuardError::Rejected(AuthFailure::NoCredential).to_string())
    );

    let response = client
        .get("/api/v1/users/me/check")
        .header(Header::new("Authorization", basic_header(BOB_EMAIL, "wrong")))
        .dispatch();
    assert_eq!(
        response.into_string(),
        Some(AuthFailure::BadPassword.to_string())
    );

    let response = client
        .get("/api/v1/users/me/check")
        .header(Header::new("Authorization", basic_header(BOB_EMAIL, BOB_PASSWORD)))
        .dispatch();
    assert_eq!(response.into_string(), Some(format!("Logged in as {BOB_EMAIL}")));
}
