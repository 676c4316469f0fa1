//! API access layer for the estate management console.
//!
//! One configured [`ApiClient`](api_client::ApiClient) carries every JSON call: the
//! request interceptor attaches the session token, the session guard turns failures
//! into typed [`ApiError`](error::ApiError)s and logs the user out on 401. Binary
//! exports go through [`Exporter`](export::Exporter).

pub mod api_client;
pub mod batch;
pub mod claims;
pub mod config;
pub mod debounce;
pub mod error;
pub mod export;
pub mod interceptor;
pub mod session;
pub mod storage;

#[cfg(test)]
mod tests;

pub use api_client::{ApiClient, RequestOptions};
pub use error::{ApiError, ErrorKind};
pub use session::{Navigator, Session, SessionState};
