use crate::error::ApiError;
use crate::session::Session;

use log::warn;
use reqwest::RequestBuilder;

/// Attaches the session token to outgoing requests.
#[derive(Clone)]
pub struct RequestInterceptor {
    session: Session,
}

impl RequestInterceptor {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Set `Authorization: Bearer <token>` when a token exists.
    ///
    /// Without a token the request goes out unauthenticated and a warning is logged,
    /// since some endpoints are public. Calls flagged `require_auth` fail here instead,
    /// before anything is sent.
    #[track_caller]
    pub fn authorize(
        &self,
        request: RequestBuilder,
        require_auth: bool,
        target: &str,
    ) -> Result<RequestBuilder, ApiError> {
        match self.session.token() {
            Some(token) => Ok(request.bearer_auth(token.expose())),
            None if require_auth => Err(ApiError::client(format!(
                "Not signed in: {target} requires a session token"
            ))),
            None => {
                warn!("No session token, sending {target} unauthenticated");
                Ok(request)
            }
        }
    }
}
