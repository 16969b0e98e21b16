//! Login/logout flow.
//!
//! ARCHITECTURE
//! ============
//! Each login or logout takes a ticket from a monotonically increasing
//! sequence before it suspends on the network. When the response arrives,
//! it may only touch the session if no operation holding a newer ticket has
//! already committed a change, so a slow response from an earlier submission
//! can never overwrite the outcome of a later one. An operation that fails
//! before committing does not block older ones.
//!
//! ERROR HANDLING
//! ==============
//! Failures are returned to the caller with the server's payload attached
//! and logged here. A 401 on either endpoint has already triggered the
//! global forced sign-out by the time the error reaches the caller.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::StatusCode;

use crate::net::api::{self, Credentials};
use crate::net::client::{ApiClient, ApiError};
use crate::net::envelope::{MissingField, ResponseShape, normalize_auth_response};
use crate::state::identity::Identity;
use crate::state::session::{SessionError, SessionStore};
use crate::util::translate::{FieldErrorTranslator, FieldErrors, field_errors_from_payload};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(&'static str),
    #[error("malformed authentication response: missing {0}")]
    MalformedResponse(MissingField),
    #[error("authentication request failed: {0}")]
    Api(#[from] ApiError),
    #[error("could not store session: {0}")]
    Session(#[from] SessionError),
    #[error("superseded by a newer sign-in or sign-out")]
    Superseded,
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(e) => e.status(),
            _ => None,
        }
    }

    /// Server-side validation errors, translated for inline display.
    #[must_use]
    pub fn field_errors(&self, translator: &dyn FieldErrorTranslator) -> FieldErrors {
        match self {
            Self::Api(e) => e
                .payload()
                .map(|payload| translator.translate(&field_errors_from_payload(payload)))
                .unwrap_or_default(),
            _ => FieldErrors::new(),
        }
    }
}

pub struct AuthFlow {
    client: Arc<ApiClient>,
    store: SessionStore,
    shape: ResponseShape,
    sequence: AtomicU64,
    /// Ticket of the last operation that changed the session.
    committed: Mutex<u64>,
}

impl AuthFlow {
    #[must_use]
    pub fn new(client: Arc<ApiClient>, store: SessionStore, shape: ResponseShape) -> Self {
        Self { client, store, shape, sequence: AtomicU64::new(0), committed: Mutex::new(0) }
    }

    /// Submit credentials and install the resulting session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] before any request if a field is blank.
    /// - [`AuthError::Api`] for transport failures and rejected credentials.
    /// - [`AuthError::MalformedResponse`] if a 2xx response lacks the token or user.
    /// - [`AuthError::Superseded`] if a newer login/logout has already
    ///   changed the session; the session is left as that operation left it.
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let credentials = credentials.validated().map_err(AuthError::InvalidCredentials)?;
        let ticket = self.begin();

        let body = api::post_login(&self.client, &credentials).await.inspect_err(|e| {
            tracing::warn!(email = %credentials.email, status = ?e.status(), error = %e, "login failed");
        })?;

        let payload = normalize_auth_response(&body, &self.shape).map_err(|missing| {
            tracing::warn!(email = %credentials.email, %missing, "login response malformed");
            AuthError::MalformedResponse(missing)
        })?;

        let mut committed = self.lock_committed();
        if *committed > ticket {
            tracing::debug!(ticket, committed = *committed, "discarding stale login response");
            return Err(AuthError::Superseded);
        }
        self.store.set_session(payload.token, payload.identity.clone())?;
        *committed = ticket;
        drop(committed);

        tracing::info!(email = %credentials.email, roles = %payload.identity.roles, "signed in");
        Ok(payload.identity)
    }

    /// Notify the server and sign out locally.
    ///
    /// The local session is cleared whether or not the server call succeeds,
    /// unless a newer login/logout already changed the session while this
    /// one was in flight.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Api`] if the server call failed; the local
    /// session has been cleared regardless, subject to the rule above.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let ticket = self.begin();
        let outcome = api::post_logout(&self.client).await;

        let mut committed = self.lock_committed();
        if *committed > ticket {
            tracing::debug!(ticket, committed = *committed, "newer sign-in or sign-out already applied; keeping it");
        } else {
            self.store.clear_session();
            *committed = ticket;
            tracing::info!("signed out");
        }
        drop(committed);

        outcome.map_err(|e| {
            tracing::warn!(status = ?e.status(), error = %e, "logout notification failed");
            AuthError::Api(e)
        })
    }

    fn begin(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn lock_committed(&self) -> MutexGuard<'_, u64> {
        self.committed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
