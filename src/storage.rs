//! Storage implementations for sessions

mod interface;
pub use interface::*;

pub mod durable;
pub mod memory;

#[cfg(feature = "sqlx_sqlite")]
pub mod sqlx;

use std::sync::Arc;

use crate::{clock::Clock, error::ConfigError, options::SessionStoreKind};

/// Build the session store selected by configuration. The durable store needs a
/// persistence to write through to.
pub fn build_store(
    kind: SessionStoreKind,
    persistence: Option<Arc<dyn SessionPersistence>>,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn SessionStore>, ConfigError> {
    match kind {
        SessionStoreKind::Memory => Ok(Arc::new(
            memory::MemoryStorage::builder().clock(clock).build(),
        )),
        SessionStoreKind::Durable => {
            let persistence = persistence.ok_or(ConfigError::MissingPersistence)?;
            Ok(Arc::new(durable::DurableStorage::with_clock(
                persistence,
                clock,
            )))
        }
    }
}
