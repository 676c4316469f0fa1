use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when something tries to write a redacted credential out.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Token Serialization Refused: {message} {location}")]
    TokenSerialization {
        message: String,
        location: ErrorLocation,
    },
}
