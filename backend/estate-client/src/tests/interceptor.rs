use super::helpers::{USER_TOKEN, capture_logs, logged, memory_session};
use crate::error::ErrorKind;
use crate::interceptor::RequestInterceptor;

use log::Level;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;

/// **VALUE**: Verifies the bearer header is attached whenever a token is stored.
///
/// **WHY THIS MATTERS**: Every protected endpoint depends on it. A missing header turns every
/// screen into a 401 and logs the user out.
#[test]
fn given_stored_token_when_authorized_then_bearer_header_is_set() {
    // GIVEN: A session holding a token
    let session = memory_session();
    session.sign_in(USER_TOKEN).unwrap();
    let interceptor = RequestInterceptor::new(session);

    // WHEN: Authorizing a request
    let request = interceptor
        .authorize(Client::new().get("http://localhost/api/bills"), false, "GET /api/bills")
        .unwrap()
        .build()
        .unwrap();

    // THEN: Authorization carries the exact token
    let header = request.headers().get(AUTHORIZATION).unwrap();
    assert_eq!(header.to_str().unwrap(), format!("Bearer {USER_TOKEN}"));
}

/// **VALUE**: Verifies that a missing token is a warning, not a failure.
///
/// **BUG THIS CATCHES**: Would catch public endpoints (sign-in itself) becoming unreachable
/// because the interceptor started rejecting anonymous requests.
#[test]
fn given_no_token_when_authorized_then_sent_without_header_and_warns() {
    // GIVEN: An empty session and a capturing logger
    capture_logs();
    let interceptor = RequestInterceptor::new(memory_session());

    // WHEN: Authorizing a request
    let request = interceptor
        .authorize(
            Client::new().get("http://localhost/api/public"),
            false,
            "GET /api/public-notice",
        )
        .unwrap()
        .build()
        .unwrap();

    // THEN: No header, warning logged
    assert!(request.headers().get(AUTHORIZATION).is_none());
    assert!(logged(Level::Warn, "GET /api/public-notice unauthenticated"));
}

#[test]
fn given_no_token_when_auth_required_then_fails_before_dispatch() {
    let interceptor = RequestInterceptor::new(memory_session());

    let result = interceptor.authorize(
        Client::new().delete("http://localhost/api/users/1"),
        true,
        "DELETE /api/users/1",
    );

    let err = result.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ClientError);
    assert!(err.user_message().contains("requires a session token"));
}
