use std::sync::Arc;

use bon::Builder;
use rocket::{fairing::Fairing, Build, Orbit, Rocket};

use crate::{
    clock::{Clock, SystemClock},
    error::ConfigError,
    identity::IdentityStore,
    storage::{build_store, SessionPersistence},
    AuthGateway, AuthOptions,
};

/// Key of the auth table in Rocket's configuration
const CONFIG_KEY: &str = "auth";

/**
A Rocket fairing that enables authentication.

On ignite, the fairing resolves the [options](AuthOptions), builds the configured
session store, and puts the resulting [`AuthGateway`] in Rocket's managed state, where
the [`CurrentUser`](crate::CurrentUser) and [`AuthSession`](crate::AuthSession) request
guards find it.

If options aren't set on the builder, they're read from the `auth` table of Rocket's
configuration (e.g. `[default.auth]` in `Rocket.toml`, or the `ROCKET_AUTH`
environment variable), falling back to the defaults.

# Example
```rust
use std::sync::Arc;
use rocket_session_auth::{identity::MemoryIdentityStore, RocketSessionAuth};

#[rocket::launch]
fn rocket() -> _ {
    let identities = MemoryIdentityStore::default();
    identities.register_user("bob@x.com", "pw1").expect("should register user");

    // Use options from Rocket's configuration
    let auth_fairing = RocketSessionAuth::builder()
        .identities(Arc::new(identities))
        .build();

    // Or customize settings with the builder
    let _custom_auth = RocketSessionAuth::builder()
        .identities(Arc::new(MemoryIdentityStore::default()))
        .with_options(|opt| {
            opt.cookie_name = "_my_session_id".to_string();
            opt.session_duration = 60 * 60; // 1 hour
            opt.excluded_paths = vec!["/api/v1/status/".to_string()];
        })
        .build();

    rocket::build()
        .attach(auth_fairing)
        // ... other configuration ...
}
```
*/
#[derive(Builder)]
pub struct RocketSessionAuth {
    /// Where users are looked up and passwords verified.
    identities: Arc<dyn IdentityStore>,
    /// Set the options directly. Alternatively, use `with_options` to customize the default options via a closure.
    /// If not set, the options are read from Rocket's configuration.
    options: Option<AuthOptions>,
    /// Persistence for the durable session store. Required if the durable store is selected.
    persistence: Option<Arc<dyn SessionPersistence>>,
    /// Clock used to stamp and age sessions (default: system clock)
    #[builder(default = Arc::new(SystemClock))]
    clock: Arc<dyn Clock>,
}

use rocket_session_auth_builder::{IsUnset, SetOptions, State};
impl<S: State> RocketSessionAuthBuilder<S> {
    /// Customize the [options](AuthOptions) via a closure. Any options that are not set will retain their default values.
    pub fn with_options<OptionsFn>(self, options_fn: OptionsFn) -> RocketSessionAuthBuilder<SetOptions<S>>
    where
        S::Options: IsUnset,
        OptionsFn: FnOnce(&mut AuthOptions),
    {
        let mut options = AuthOptions::default();
        options_fn(&mut options);
        self.options(options)
    }
}

impl RocketSessionAuth {
    fn resolve_options(&self, rocket: &Rocket<Build>) -> Result<AuthOptions, ConfigError> {
        if let Some(options) = &self.options {
            return Ok(options.clone());
        }
        let figment = rocket.figment();
        if figment.find_value(CONFIG_KEY).is_err() {
            rocket::debug!("No auth configuration found, using defaults");
            return Ok(AuthOptions::default());
        }
        Ok(figment.extract_inner(CONFIG_KEY)?)
    }

    fn build_gateway(&self, rocket: &Rocket<Build>) -> Result<AuthGateway, ConfigError> {
        let options = self.resolve_options(rocket)?;
        let sessions = build_store(
            options.session_store,
            self.persistence.clone(),
            self.clock.clone(),
        )?;
        Ok(AuthGateway::builder()
            .identities(self.identities.clone())
            .sessions(sessions)
            .options(options)
            .clock(self.clock.clone())
            .build())
    }
}

#[rocket::async_trait]
impl Fairing for RocketSessionAuth {
    fn info(&self) -> rocket::fairing::Info {
        use rocket::fairing::Kind;
        rocket::fairing::Info {
            name: "Rocket Session Auth",
            kind: Kind::Ignite | Kind::Shutdown | Kind::Singleton,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> Result<Rocket<Build>, Rocket<Build>> {
        let gateway = match self.build_gateway(&rocket) {
            Ok(gateway) => gateway,
            Err(e) => {
                rocket::error!("Failed to configure authentication: {e}");
                return Err(rocket);
            }
        };

        rocket::debug!("Setting up session store...");
        if let Err(e) = gateway.sessions().setup().await {
            rocket::warn!("Error during session store setup: {e}");
        }

        Ok(rocket.manage(gateway))
    }

    async fn on_shutdown(&self, rocket: &Rocket<Orbit>) {
        let Some(gateway) = rocket.state::<AuthGateway>() else {
            return;
        };
        rocket::debug!("Shutting down session store...");
        if let Err(e) = gateway.sessions().shutdown().await {
            rocket::warn!("Error during session store shutdown: {e}");
        }
    }
}
