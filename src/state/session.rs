//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The single source of truth for "who is signed in". Route guards read it,
//! the login/logout flow and the forced sign-out path mutate it. Every
//! mutation mirrors itself into durable storage and into the HTTP client's
//! default headers before returning, so readers never observe a token without
//! its identity or a session without its `Authorization` header.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::InvalidHeaderValue;
use serde_json::Value;

use super::identity::{Identity, Role};
use crate::net::client::{DefaultHeaders, bearer_value};
use crate::storage::{DurableStorage, StorageError, load_json, save_json};

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key holding the JSON-serialized [`Identity`].
pub const USER_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),
    #[error("token is not a valid header value")]
    InvalidToken(#[from] InvalidHeaderValue),
}

/// Point-in-time copy of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub identity: Identity,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.is_admin()
    }

    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.identity.has_role(role)
    }
}

/// Shared handle to the session. Clones observe the same state.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<Session>>,
    storage: Arc<dyn DurableStorage>,
    headers: DefaultHeaders,
}

impl SessionStore {
    /// Build the store from whatever durable storage holds.
    ///
    /// A session is restored only when a non-empty token and a decodable
    /// identity object are both present; anything else starts anonymous and
    /// drops whichever half of the pair was left behind.
    pub fn hydrate(storage: Arc<dyn DurableStorage>, headers: DefaultHeaders) -> Self {
        let session = restore(storage.as_ref()).unwrap_or_else(|| {
            discard_partial(storage.as_ref());
            Session::default()
        });
        match session.token.as_deref().map(bearer_value) {
            Some(Ok(value)) => headers.set_authorization(value),
            Some(Err(_)) | None => headers.remove_authorization(),
        }
        tracing::debug!(authenticated = session.is_authenticated(), "session hydrated");
        Self { state: Arc::new(RwLock::new(session)), storage, headers }
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).is_authenticated()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).is_admin()
    }

    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).has_role(role)
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).token.clone()
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        self.state.read().unwrap_or_else(PoisonError::into_inner).identity.clone()
    }

    /// Install a new session: storage first, then memory and the default
    /// `Authorization` header together.
    ///
    /// # Errors
    ///
    /// Returns an error and leaves the previous session untouched if the
    /// token cannot be sent as a header or either key fails to persist.
    pub fn set_session(&self, token: String, identity: Identity) -> Result<(), SessionError> {
        let header = bearer_value(&token)?;
        let user_json = serde_json::to_string(&identity).map_err(StorageError::from)?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = self.persist(&token, &user_json) {
            self.restore_persisted(&state);
            return Err(e.into());
        }
        *state = Session { token: Some(token), identity };
        self.headers.set_authorization(header);
        Ok(())
    }

    /// Sign out locally. Storage failures are logged; memory and headers are
    /// always reset.
    pub fn clear_session(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Session::default();
        self.headers.remove_authorization();
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove_item(key) {
                tracing::warn!(key, error = %e, "failed to remove persisted session key");
            }
        }
    }

    /// Forced sign-out after the server rejected the credentials: resets
    /// memory and headers and wipes every key in durable storage.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Session::default();
        self.headers.remove_authorization();
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "failed to wipe storage during forced sign-out");
        }
    }

    fn persist(&self, token: &str, user_json: &str) -> Result<(), StorageError> {
        self.storage.set_item(TOKEN_KEY, token)?;
        self.storage.set_item(USER_KEY, user_json)
    }

    /// Put storage back in line with `previous` after a partial write.
    fn restore_persisted(&self, previous: &Session) {
        let outcome = match &previous.token {
            Some(token) => self
                .storage
                .set_item(TOKEN_KEY, token)
                .and_then(|()| save_json(self.storage.as_ref(), USER_KEY, &previous.identity)),
            None => self
                .storage
                .remove_item(TOKEN_KEY)
                .and_then(|()| self.storage.remove_item(USER_KEY)),
        };
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "failed to roll back partially persisted session");
        }
    }
}

fn restore(storage: &dyn DurableStorage) -> Option<Session> {
    let token = storage.get_item(TOKEN_KEY).filter(|t| !t.is_empty())?;
    let identity = load_json::<Value>(storage, USER_KEY)
        .filter(Value::is_object)
        .and_then(|user| serde_json::from_value::<Identity>(user).ok());
    let Some(identity) = identity else {
        tracing::warn!("persisted user record is missing or malformed; starting signed out");
        return None;
    };
    if bearer_value(&token).is_err() {
        tracing::warn!("persisted token is not a valid header value; starting signed out");
        return None;
    }
    Some(Session { token: Some(token), identity })
}

fn discard_partial(storage: &dyn DurableStorage) {
    for key in [TOKEN_KEY, USER_KEY] {
        if storage.get_item(key).is_none() {
            continue;
        }
        if let Err(e) = storage.remove_item(key) {
            tracing::warn!(key, error = %e, "failed to remove orphaned session key");
        }
    }
}
