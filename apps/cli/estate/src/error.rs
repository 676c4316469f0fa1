use estate_client::error::{ApiError, ConfigError, CoreError, StorageError};

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the command-line front end.
///
/// Every variant keeps its location; [`EstateError::user_message`] is what the
/// user sees on stderr.
#[derive(Debug, Error)]
pub enum EstateError {
    /// Error from this App
    #[error("Estate Error: {message} {location}")]
    Estate {
        message: String,
        location: ErrorLocation,
    },

    /// A failed backend call
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EstateError {
    #[track_caller]
    pub fn estate(message: impl Into<String>) -> Self {
        EstateError::Estate {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            EstateError::Estate { message, .. } => message.clone(),
            EstateError::Api(err) => err.user_message(),
            EstateError::Config(err) => err.to_string(),
            EstateError::Storage(err) => err.to_string(),
        }
    }
}

impl From<CoreError> for EstateError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Api(err) => EstateError::Api(err),
            CoreError::Config(err) => EstateError::Config(err),
            CoreError::Storage(err) => EstateError::Storage(err),
        }
    }
}
