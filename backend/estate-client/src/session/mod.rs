//! Session lifecycle over the storage port.
//!
//! ```text
//! LoggedOut --sign_in--> Authenticated --(401 or sign_out)--> LoggedOut
//! ```
//!
//! There is no refresh: an expired token stays in place until the backend answers 401.

pub mod navigator;

pub use navigator::{Navigator, SIGN_IN_PATH};

use crate::error::StorageError;
use crate::storage::{NOTIFICATION_TARGETS_KEY, Storage, TOKEN_KEY};

use common::{ErrorLocation, RedactedToken};

use std::sync::Arc;

use log::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    LoggedOut,
}

/// Handle to the process-wide session. Clones share the same storage.
#[derive(Clone)]
pub struct Session {
    storage: Arc<dyn Storage>,
}

impl Session {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Current token. A storage failure reads as "no token" and is logged.
    pub fn token(&self) -> Option<RedactedToken> {
        match self.storage.get_item(TOKEN_KEY) {
            Ok(Some(raw)) => {
                let token = RedactedToken::new(raw);
                (!token.is_empty()).then_some(token)
            }
            Ok(None) => None,
            Err(e) => {
                error!("Failed to read session token: {e}");
                None
            }
        }
    }

    pub fn state(&self) -> SessionState {
        match self.token() {
            Some(_) => SessionState::Authenticated,
            None => SessionState::LoggedOut,
        }
    }

    /// Store a freshly issued token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ValueError`] for a blank token, or the storage failure.
    #[track_caller]
    pub fn sign_in(&self, token: impl Into<String>) -> Result<(), StorageError> {
        let token = RedactedToken::new(token);
        if token.is_empty() {
            return Err(StorageError::ValueError {
                location: ErrorLocation::caller(),
                key: TOKEN_KEY.to_string(),
                reason: String::from("token is empty"),
            });
        }
        self.storage.set_item(TOKEN_KEY, token.expose().trim())?;
        info!("Session established ({} char token)", token.len());
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), StorageError> {
        self.storage.remove_item(TOKEN_KEY)?;
        info!("Session cleared");
        Ok(())
    }

    pub fn notification_targets(&self) -> NotificationTargets {
        NotificationTargets {
            storage: Arc::clone(&self.storage),
        }
    }
}

/// User ids picked on a list screen for the batch notification flow.
///
/// Written by the selection screen, consumed exactly once by the send step.
#[derive(Clone)]
pub struct NotificationTargets {
    storage: Arc<dyn Storage>,
}

impl NotificationTargets {
    #[track_caller]
    pub fn store(&self, user_ids: &[String]) -> Result<(), StorageError> {
        let json = serde_json::to_string(user_ids).map_err(|e| StorageError::ValueError {
            location: ErrorLocation::caller(),
            key: NOTIFICATION_TARGETS_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.storage.set_item(NOTIFICATION_TARGETS_KEY, &json)
    }

    /// Read the stored ids and clear them. Empty when nothing was stored.
    #[track_caller]
    pub fn take(&self) -> Result<Vec<String>, StorageError> {
        let Some(raw) = self.storage.get_item(NOTIFICATION_TARGETS_KEY)? else {
            return Ok(Vec::new());
        };
        self.storage.remove_item(NOTIFICATION_TARGETS_KEY)?;

        serde_json::from_str(&raw).map_err(|e| StorageError::ValueError {
            location: ErrorLocation::caller(),
            key: NOTIFICATION_TARGETS_KEY.to_string(),
            reason: e.to_string(),
        })
    }
}
