//! Hooks every request and response pass through.

pub mod error_body;
pub mod request;
pub mod response;

pub use error_body::{ErrorBody, FieldError, parse_error_body};
pub use request::RequestInterceptor;
pub use response::{SessionGuard, classify};
