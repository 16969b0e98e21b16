//! Application shell: builds every service once and wires them together.
//!
//! SYSTEM CONTEXT
//! ==============
//! Nothing in this crate is a global. The shell constructs the session store
//! from durable storage, gives the HTTP client the store's header set and the
//! forced sign-out sink, and hands the same store to the router and the
//! login/logout flow. Dropping the `App` tears all of it down.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::net::client::{ApiClient, ApiError, DefaultHeaders};
use crate::net::interceptor::{ForcedSignOut, UnauthorizedInterceptor};
use crate::router::Router;
use crate::router::history::Navigator;
use crate::router::routes::RouteTable;
use crate::services::auth::AuthFlow;
use crate::state::session::SessionStore;
use crate::storage::DurableStorage;

pub struct App {
    store: SessionStore,
    client: Arc<ApiClient>,
    auth: AuthFlow,
    router: Router,
    navigator: Arc<dyn Navigator>,
}

impl App {
    /// Hydrate the session and assemble the client, flow and router.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn bootstrap(
        config: &ClientConfig,
        storage: Arc<dyn DurableStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let headers = DefaultHeaders::new();
        let store = SessionStore::hydrate(storage, headers.clone());

        let client = ApiClient::builder(config, headers)
            .interceptor(Arc::new(UnauthorizedInterceptor))
            .on_invalidation(Arc::new(ForcedSignOut::new(store.clone(), navigator.clone())))
            .build()?;
        let client = Arc::new(client);

        let auth = AuthFlow::new(client.clone(), store.clone(), config.shape.clone());
        let router = Router::new(RouteTable::standard(), store.clone(), navigator.clone());

        tracing::info!(
            api_root = client.api_root(),
            authenticated = store.is_authenticated(),
            "application started"
        );
        Ok(Self { store, client, auth, router, navigator })
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn current_path(&self) -> String {
        self.navigator.current_path()
    }
}
