//! Key/value storage port with local-storage semantics.
//!
//! The session token and the notification target list live here. The client only
//! ever talks to the [`Storage`] trait so tests can hand it a [`MemoryStorage`].

pub mod file;

pub use file::FileStorage;

use crate::error::StorageError;

use common::ErrorLocation;

use std::collections::HashMap;
use std::sync::RwLock;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the user ids selected for a batch notification.
pub const NOTIFICATION_TARGETS_KEY: &str = "selectedUserIds";

pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    #[track_caller]
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.read().map_err(|_| StorageError::Poisoned {
            location: ErrorLocation::caller(),
        })?;
        Ok(items.get(key).cloned())
    }

    #[track_caller]
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned {
            location: ErrorLocation::caller(),
        })?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[track_caller]
    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned {
            location: ErrorLocation::caller(),
        })?;
        items.remove(key);
        Ok(())
    }
}
