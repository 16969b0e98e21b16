//! Durable key-value storage for client state that must survive a restart.
//!
//! SYSTEM CONTEXT
//! ==============
//! Plays the role browser `localStorage` plays for a web client: the session
//! store mirrors its token and identity here, and the forced sign-out path
//! wipes it wholesale. `MemoryStorage` backs tests and ephemeral runs,
//! `FileStorage` backs the command-line front end.

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

mod file;

pub use file::FileStorage;

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Error returned by [`DurableStorage`] writes.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value store with `localStorage` semantics.
///
/// Reads never fail: a key that cannot be read is reported as absent.
/// Writes report their failure so callers can keep paired keys consistent.
pub trait DurableStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    /// Remove every key.
    fn clear(&self) -> Result<(), StorageError>;
    fn keys(&self) -> Vec<String>;
}

/// Load a JSON value stored under `key`.
///
/// Returns `None` when the key is missing or its contents do not decode as `T`.
pub fn load_json<T: DeserializeOwned>(storage: &dyn DurableStorage, key: &str) -> Option<T> {
    let raw = storage.get_item(key)?;
    serde_json::from_str(&raw).ok()
}

/// Save `value` as JSON under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the underlying write fails.
pub fn save_json<T: Serialize>(storage: &dyn DurableStorage, key: &str, value: &T) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set_item(key, &raw)
}

/// Process-local storage; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a storage with existing key-value pairs.
    #[must_use]
    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let items = items.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { items: RwLock::new(items) }
    }
}

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.write().unwrap_or_else(PoisonError::into_inner).remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.items.write().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.items.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }
}
