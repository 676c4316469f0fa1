//! Shared primitives for the estate console workspace.
//!
//! Everything in here is plain data with no I/O: source locations for
//! error reporting, HTTP status categorisation, and the redacted wrapper the
//! session token travels in.
//!
//! ## Architecture
//!
//! - **common** (this crate): shared primitives
//! - **estate-client**: API access layer operating on them
//! - **estate**: command-line wiring

pub mod error;
pub mod http_status;
pub mod redacted_token;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_token::RedactedToken;
