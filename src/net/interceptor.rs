//! Response interceptors and the forced sign-out they can trigger.
//!
//! SYSTEM CONTEXT
//! ==============
//! A 401 from any endpoint means the server no longer accepts our token.
//! `UnauthorizedInterceptor` turns that status into a signal; `ForcedSignOut`
//! consumes the signal by wiping the session and doing a full reload of the
//! login screen, regardless of which screen issued the failing request.

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod interceptor_test;

use std::sync::Arc;

use reqwest::{Method, StatusCode};

use crate::router::history::Navigator;
use crate::router::routes::RouteName;
use crate::state::session::SessionStore;

/// What an interceptor gets to see of each response.
#[derive(Debug, Clone, Copy)]
pub struct ResponseMeta<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub status: StatusCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    Pass,
    InvalidateSession,
}

pub trait ResponseInterceptor: Send + Sync {
    fn intercept(&self, response: &ResponseMeta<'_>) -> Interception;
}

/// Consumer of session-invalidated signals raised by interceptors.
pub trait InvalidationSink: Send + Sync {
    fn session_invalidated(&self, cause: &ResponseMeta<'_>);
}

/// Raises [`Interception::InvalidateSession`] for every 401.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnauthorizedInterceptor;

impl ResponseInterceptor for UnauthorizedInterceptor {
    fn intercept(&self, response: &ResponseMeta<'_>) -> Interception {
        if response.status == StatusCode::UNAUTHORIZED {
            Interception::InvalidateSession
        } else {
            Interception::Pass
        }
    }
}

/// Wipes the session and hard-navigates to the login screen.
pub struct ForcedSignOut {
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl ForcedSignOut {
    #[must_use]
    pub fn new(store: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }
}

impl InvalidationSink for ForcedSignOut {
    fn session_invalidated(&self, cause: &ResponseMeta<'_>) {
        tracing::info!(
            method = %cause.method,
            path = cause.path,
            status = %cause.status,
            "server rejected session; forcing sign-out"
        );
        self.store.invalidate();
        self.navigator.hard_redirect(RouteName::Login.path());
    }
}
