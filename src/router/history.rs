//! Current location and the two ways of changing it.
//!
//! A soft push is an in-app transition that keeps in-memory state. A hard
//! redirect stands in for assigning `window.location`: a full load of the
//! target that every in-memory cache must treat as a fresh start.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::sync::{PoisonError, RwLock};

pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    /// In-app transition.
    fn push(&self, path: &str);
    /// Full page load of `path`, bypassing in-app routing.
    fn hard_redirect(&self, path: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Initial,
    Soft,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub path: String,
    pub kind: NavigationKind,
}

/// In-memory location history.
#[derive(Debug)]
pub struct History {
    visits: RwLock<Vec<Visit>>,
}

impl History {
    #[must_use]
    pub fn new(initial_path: &str) -> Self {
        let first = Visit { path: initial_path.to_owned(), kind: NavigationKind::Initial };
        Self { visits: RwLock::new(vec![first]) }
    }

    #[must_use]
    pub fn last_kind(&self) -> NavigationKind {
        self.visits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map_or(NavigationKind::Initial, |v| v.kind)
    }

    /// Number of full page loads since start-up.
    #[must_use]
    pub fn hard_loads(&self) -> usize {
        self.visits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|v| v.kind == NavigationKind::Hard)
            .count()
    }

    #[must_use]
    pub fn visits(&self) -> Vec<Visit> {
        self.visits.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, path: &str, kind: NavigationKind) {
        self.visits
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Visit { path: path.to_owned(), kind });
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for History {
    fn current_path(&self) -> String {
        self.visits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map_or_else(|| "/".to_owned(), |v| v.path.clone())
    }

    fn push(&self, path: &str) {
        self.record(path, NavigationKind::Soft);
    }

    fn hard_redirect(&self, path: &str) {
        tracing::debug!(path, "hard redirect");
        self.record(path, NavigationKind::Hard);
    }
}
