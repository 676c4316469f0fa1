//! Error types for calls made through the API access layer.
//!
//! Key design decisions:
//! - HTTP status codes stored directly (not parsed from strings)
//! - `kind()` gives the category a screen switches on, `user_message()` the toast text
//! - All errors include ErrorLocation for debugging
//! - `#[track_caller]` for automatic location capture

use crate::claims::PrivilegeDiagnostic;
use crate::interceptor::error_body::{ErrorBody, FieldError};

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

/// Shown for every failure where no response arrived, whatever the transport said.
pub const NETWORK_ERROR_MESSAGE: &str = "Server unreachable, please try again later.";

/// Shown after the session guard has logged the user out.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Prefix for 403 responses where the token role is not an admin role.
pub const ADMIN_PRIVILEGE_REQUIRED_MESSAGE: &str = "Admin privilege required";

/// Category of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    ServerError,
    NetworkError,
    ValidationError,
    ClientError,
}

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("Unauthorized: {message} {location}")]
    Unauthorized {
        message: String,
        location: ErrorLocation,
    },

    #[error("Forbidden: {message} {location}")]
    Forbidden {
        message: String,
        body: ErrorBody,
        diagnostic: Option<PrivilegeDiagnostic>,
        location: ErrorLocation,
    },

    #[error("Validation Error: HTTP {status_code} - {message} {location}")]
    Validation {
        status_code: HttpStatusCode,
        message: String,
        body: ErrorBody,
        location: ErrorLocation,
    },

    #[error("Server Error: HTTP {status_code} - {message} {location}")]
    Server {
        status_code: HttpStatusCode,
        message: String,
        body: ErrorBody,
        location: ErrorLocation,
    },

    #[error("Network Error: {message} {location}")]
    Network {
        message: String,
        is_timeout: bool,
        is_connection: bool,
        location: ErrorLocation,
    },

    #[error("Export Failed: HTTP {status_code} {location}")]
    Export {
        status_code: HttpStatusCode,
        location: ErrorLocation,
    },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Client Error: {message} {location}")]
    Client {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },
}

impl ApiError {
    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn forbidden(body: ErrorBody, diagnostic: Option<PrivilegeDiagnostic>) -> Self {
        ApiError::Forbidden {
            message: body.message_or("Access denied"),
            body,
            diagnostic,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn validation(status_code: u16, body: ErrorBody) -> Self {
        ApiError::Validation {
            status_code: HttpStatusCode(status_code),
            message: body.message_or("Request rejected"),
            body,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn server(status_code: u16, body: ErrorBody) -> Self {
        let fallback = format!("Request failed with HTTP {status_code}");
        ApiError::Server {
            status_code: HttpStatusCode(status_code),
            message: body.message_or(&fallback),
            body,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn export_failed(status_code: u16) -> Self {
        ApiError::Export {
            status_code: HttpStatusCode(status_code),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn decode(message: impl Into<String>) -> Self {
        ApiError::Decode {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn client(message: impl Into<String>) -> Self {
        ApiError::Client {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create from a failed send. A request that could not be built never left the
    /// process, so it is a client error rather than an unreachable server.
    #[track_caller]
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_builder() {
            return ApiError::client(format!("Request could not be sent: {error}"));
        }
        ApiError::Network {
            message: error.to_string(),
            is_timeout: error.is_timeout(),
            is_connection: error.is_connect(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create from a failure reading a body after the response arrived.
    #[track_caller]
    pub fn from_body_read(error: &reqwest::Error) -> Self {
        ApiError::decode(format!("Failed to read response body: {error}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ApiError::Forbidden { .. } => ErrorKind::Forbidden,
            ApiError::Validation { .. } => ErrorKind::ValidationError,
            ApiError::Server { .. } => ErrorKind::ServerError,
            ApiError::Export { .. } => ErrorKind::ServerError,
            ApiError::Decode { .. } => ErrorKind::ServerError,
            ApiError::Network { .. } => ErrorKind::NetworkError,
            ApiError::Client { .. } => ErrorKind::ClientError,
            ApiError::Io { .. } => ErrorKind::ClientError,
        }
    }

    /// Text for a toast or inline message. Never empty.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { .. } => SESSION_EXPIRED_MESSAGE.to_string(),
            ApiError::Forbidden {
                message,
                diagnostic,
                ..
            } => match diagnostic {
                Some(diagnostic) if diagnostic.lacks_admin => {
                    format!("{ADMIN_PRIVILEGE_REQUIRED_MESSAGE} ({diagnostic}): {message}")
                }
                _ => message.clone(),
            },
            ApiError::Network { .. } => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Export { status_code, .. } => {
                format!("Export/download failed (HTTP {status_code})")
            }
            ApiError::Validation { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Decode { message, .. }
            | ApiError::Client { message, .. }
            | ApiError::Io { message, .. } => message.clone(),
        }
    }

    /// HTTP status if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(HttpStatusCode::UNAUTHORIZED.0),
            ApiError::Forbidden { .. } => Some(HttpStatusCode::FORBIDDEN.0),
            ApiError::Validation { status_code, .. }
            | ApiError::Server { status_code, .. }
            | ApiError::Export { status_code, .. } => Some(status_code.0),
            _ => None,
        }
    }

    /// Per-field messages for inline display; empty unless the server rejected input.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            ApiError::Validation { body, .. } => body.field_errors(),
            _ => Vec::new(),
        }
    }
}

impl From<url::ParseError> for ApiError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        ApiError::Client {
            message: format!("Invalid request path: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        ApiError::Decode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        ApiError::from_transport(&error)
    }
}

impl From<std::io::Error> for ApiError {
    #[track_caller]
    fn from(error: std::io::Error) -> Self {
        ApiError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
