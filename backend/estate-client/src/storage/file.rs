use super::Storage;
use crate::error::StorageError;

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::{debug, info};

/// Storage persisted as a flat JSON object, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file, starting empty when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file exists but cannot be read or is not a
    /// JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let items = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).map_err(|e| StorageError::ReadError {
                    location: ErrorLocation::from(Location::caller()),
                    path: path.clone(),
                    source: e,
                })?;
            serde_json::from_str(&contents).map_err(|e| StorageError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            debug!("Storage file {} not found, starting empty", path.display());
            BTreeMap::new()
        };

        info!("Storage opened at {}", path.display());
        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temp file + rename so a crash never leaves a half-written file.
    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::WriteError {
                location: ErrorLocation::from(Location::caller()),
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(items).map_err(|e| StorageError::ValueError {
            location: ErrorLocation::from(Location::caller()),
            key: String::from("*"),
            reason: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(|e| StorageError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| StorageError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.read().map_err(|_| StorageError::Poisoned {
            location: ErrorLocation::from(Location::caller()),
        })?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned {
            location: ErrorLocation::from(Location::caller()),
        })?;
        let mut updated = items.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *items = updated;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned {
            location: ErrorLocation::from(Location::caller()),
        })?;
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut updated = items.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *items = updated;
        Ok(())
    }
}
