#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rocket::async_trait;
use rocket_session_auth::{
    error::{StoreError, StoreResult},
    identity::{Identity, MemoryIdentityStore},
    storage::{Session, SessionFilter, SessionPersistence},
};

pub const BOB_EMAIL: &str = "bob@x.com";
pub const BOB_PASSWORD: &str = "pw1";
pub const ALICE_EMAIL: &str = "alice@x.com";
pub const ALICE_PASSWORD: &str = "pw2";

/// Identity store seeded with Bob and Alice
pub fn seeded_identities() -> (Arc<MemoryIdentityStore>, Identity, Identity) {
    let store = MemoryIdentityStore::default();
    let bob = store
        .register_user(BOB_EMAIL, BOB_PASSWORD)
        .expect("Should register Bob");
    let alice = store
        .register_user(ALICE_EMAIL, ALICE_PASSWORD)
        .expect("Should register Alice");
    (Arc::new(store), bob, alice)
}

/// Value of a Basic `Authorization` header
pub fn basic_header(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// In-memory stand-in for an external session database, which can be taken offline
#[derive(Default)]
pub struct FakePersistence {
    sessions: Mutex<Vec<Session>>,
    offline: AtomicBool,
}

impl FakePersistence {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::StoreUnavailable("database is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionPersistence for FakePersistence {
    async fn save(&self, session: &Session) -> StoreResult<()> {
        self.check_online()?;
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn search(&self, filter: &SessionFilter) -> StoreResult<Vec<Session>> {
        self.check_online()?;
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.iter().filter(|s| filter.matches(s)).cloned().collect())
    }

    async fn remove(&self, session: &Session) -> StoreResult<()> {
        self.check_online()?;
        self.sessions
            .lock()
            .unwrap()
            .retain(|s| s.id() != session.id());
        Ok(())
    }
}
