//! Client-side routing: route table, guard, and location history.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Router::navigate` is the single entry point for in-app transitions. It
//! reads the session once per transition, follows guard redirects to their
//! final destination, and records the landing path as a soft navigation.
//! Forced sign-out bypasses the router entirely with a hard redirect.

pub mod guard;
pub mod history;
pub mod routes;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::sync::Arc;

use guard::Verdict;
use history::Navigator;
use routes::{RouteName, RouteTable, normalize_path};

use crate::state::session::SessionStore;

/// Redirect chains longer than this are treated as a loop.
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("no route matches {0}")]
    NotFound(String),
    #[error("redirect loop while navigating to {0}")]
    RedirectLoop(String),
}

/// Where a transition ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landing {
    pub route: RouteName,
    pub path: String,
    /// Guard redirects taken on the way, in order.
    pub redirects: Vec<RouteName>,
}

impl Landing {
    #[must_use]
    pub fn was_redirected(&self) -> bool {
        !self.redirects.is_empty()
    }
}

pub struct Router {
    table: RouteTable,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl Router {
    #[must_use]
    pub fn new(table: RouteTable, store: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self { table, store, navigator }
    }

    /// Route `path` through the guard and record where it lands.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NotFound`] when an admitted path matches no
    /// route, and [`RouteError::RedirectLoop`] when guard redirects do not
    /// settle.
    pub fn navigate(&self, path: &str) -> Result<Landing, RouteError> {
        let session = self.store.snapshot();
        let requested = normalize_path(path);
        let mut target = requested.clone();
        let mut redirects = Vec::new();

        loop {
            let matched = self.table.resolve(&target);
            match guard::evaluate(&matched, &session) {
                Verdict::Redirect(name) => {
                    tracing::debug!(from = %target, to = name.as_str(), "navigation redirected");
                    if redirects.len() >= MAX_REDIRECTS {
                        return Err(RouteError::RedirectLoop(requested));
                    }
                    redirects.push(name);
                    target = name.path().to_owned();
                }
                Verdict::Allow => {
                    let Some(leaf) = matched.last() else {
                        return Err(RouteError::NotFound(target));
                    };
                    self.navigator.push(&target);
                    return Ok(Landing { route: leaf.name, path: target, redirects });
                }
            }
        }
    }

    /// The route under the current location, if it is a known one.
    #[must_use]
    pub fn current(&self) -> Option<RouteName> {
        self.table.resolve(&self.navigator.current_path()).last().map(|r| r.name)
    }
}
