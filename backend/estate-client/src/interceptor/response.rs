use crate::claims::PrivilegeDiagnostic;
use crate::error::ApiError;
use crate::interceptor::error_body::{ErrorBody, parse_error_body};
use crate::session::{Navigator, Session};

use common::{HttpStatusCode, RedactedToken};

use std::sync::Arc;

use log::{error, warn};
use reqwest::Response;

/// Runs on every response before the caller sees it.
///
/// Failures always come back as `Err` after logging so each screen can show its own
/// toast; the guard only adds side effects. The one global side effect is on 401:
/// the token is cleared and the user is sent to the sign-in page, whichever request
/// triggered it.
#[derive(Clone)]
pub struct SessionGuard {
    session: Session,
    navigator: Arc<dyn Navigator>,
    sign_in_path: String,
}

impl SessionGuard {
    pub fn new(
        session: Session,
        navigator: Arc<dyn Navigator>,
        sign_in_path: impl Into<String>,
    ) -> Self {
        Self {
            session,
            navigator,
            sign_in_path: sign_in_path.into(),
        }
    }

    pub async fn inspect(
        &self,
        outcome: Result<Response, reqwest::Error>,
    ) -> Result<Response, ApiError> {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::from_transport(&e);
                error!("Request was not answered: {err}");
                return Err(err);
            }
        };

        let status = HttpStatusCode(response.status().as_u16());
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let raw_body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read error body from {url}: {e}");
                String::new()
            }
        };

        let err = self.reject(status.0, &raw_body);
        if status.is_server_error() {
            error!("Request to {url} failed: {err}");
        } else {
            warn!("Request to {url} rejected: {err}");
        }
        Err(err)
    }

    /// Classify a non-2xx response and apply its side effects.
    pub fn reject(&self, status_code: u16, raw_body: &str) -> ApiError {
        let token = self.session.token();
        let err = classify(status_code, parse_error_body(raw_body), token.as_ref());

        match &err {
            ApiError::Unauthorized { .. } => self.expire_session(),
            ApiError::Forbidden { diagnostic, .. } => match diagnostic {
                Some(diagnostic) if diagnostic.lacks_admin => {
                    warn!("Access denied, token lacks admin privilege ({diagnostic})")
                }
                Some(diagnostic) => warn!("Access denied despite {diagnostic}"),
                None => warn!("Access denied, token payload not decodable"),
            },
            _ => {}
        }
        err
    }

    fn expire_session(&self) {
        if let Err(e) = self.session.sign_out() {
            error!("Failed to clear session after 401: {e}");
        }
        warn!("Session rejected, redirecting to {}", self.sign_in_path);
        self.navigator.redirect(&self.sign_in_path);
    }
}

/// Map a non-2xx status and its body to an error. No side effects.
pub fn classify(status_code: u16, body: ErrorBody, token: Option<&RedactedToken>) -> ApiError {
    match HttpStatusCode(status_code) {
        HttpStatusCode::UNAUTHORIZED => ApiError::unauthorized(body.message_or("Unauthorized")),
        HttpStatusCode::FORBIDDEN => {
            ApiError::forbidden(body, token.and_then(PrivilegeDiagnostic::from_token))
        }
        status if status.is_validation_error() => ApiError::validation(status_code, body),
        _ => ApiError::server(status_code, body),
    }
}
