use super::helpers::{ADMIN_TOKEN, RecordingNavigator, USER_TOKEN, memory_session};
use crate::error::ErrorKind;
use crate::error::api::{ADMIN_PRIVILEGE_REQUIRED_MESSAGE, SESSION_EXPIRED_MESSAGE};
use crate::interceptor::{ErrorBody, SessionGuard, classify};
use crate::session::{SIGN_IN_PATH, Session, SessionState};

use common::RedactedToken;

use std::sync::Arc;

fn guard_with(token: Option<&str>) -> (SessionGuard, Session, RecordingNavigator) {
    let session = memory_session();
    if let Some(token) = token {
        session.sign_in(token).unwrap();
    }
    let navigator = RecordingNavigator::default();
    let guard = SessionGuard::new(session.clone(), Arc::new(navigator.clone()), SIGN_IN_PATH);
    (guard, session, navigator)
}

/// **VALUE**: Verifies the forced logout on 401.
///
/// **WHY THIS MATTERS**: A 401 means the token is dead. Keeping it would make every following
/// request fail the same way while the UI still looks signed in.
///
/// **BUG THIS CATCHES**: Would catch the token surviving a 401, or the redirect firing zero or
/// several times.
#[test]
fn given_token_when_401_then_token_cleared_and_redirected_once() {
    // GIVEN: An authenticated session
    let (guard, session, navigator) = guard_with(Some(USER_TOKEN));

    // WHEN: The backend answers 401
    let err = guard.reject(401, r#"{"message":"JWT expired"}"#);

    // THEN: Logged out, one redirect to sign-in, caller still gets the error
    assert_eq!(session.state(), SessionState::LoggedOut);
    assert!(session.token().is_none());
    assert_eq!(navigator.redirects(), vec![SIGN_IN_PATH.to_string()]);
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.user_message(), SESSION_EXPIRED_MESSAGE);
}

/// **VALUE**: Verifies the 403 scenario: user role, admin message, token untouched.
#[test]
fn given_user_role_token_when_403_then_admin_required_and_token_kept() {
    // GIVEN: A session holding a ROLE_USER token
    let (guard, session, navigator) = guard_with(Some(USER_TOKEN));

    // WHEN: The backend refuses the request
    let err = guard.reject(403, r#"{"message":"Access is denied"}"#);

    // THEN: Privilege diagnostic, no logout
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let message = err.user_message();
    assert!(message.starts_with(ADMIN_PRIVILEGE_REQUIRED_MESSAGE), "{message}");
    assert!(message.contains("ROLE_USER"));
    assert!(message.contains("Access is denied"));
    assert_eq!(session.token().unwrap().expose(), USER_TOKEN);
    assert!(navigator.redirects().is_empty());
}

#[test]
fn given_admin_token_when_403_then_server_message_only() {
    let (guard, session, _) = guard_with(Some(ADMIN_TOKEN));

    let err = guard.reject(403, "Locked by another administrator");

    assert_eq!(err.user_message(), "Locked by another administrator");
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[test]
fn given_undecodable_token_when_403_then_no_diagnostic() {
    let (guard, _, _) = guard_with(Some("opaque-session-id"));

    let err = guard.reject(403, "");

    assert_eq!(err.user_message(), "Access denied");
}

#[test]
fn given_500_with_text_body_when_rejected_then_body_passed_through() {
    let (guard, session, navigator) = guard_with(Some(USER_TOKEN));

    let err = guard.reject(500, "Database connection lost");

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.user_message(), "Database connection lost");
    assert_eq!(session.state(), SessionState::Authenticated);
    assert!(navigator.redirects().is_empty());
}

#[test]
fn given_422_with_field_errors_when_rejected_then_validation_kind_with_fields() {
    let (guard, _, _) = guard_with(Some(USER_TOKEN));

    let err = guard.reject(
        422,
        r#"{"message":"Invalid bill","errors":{"amount":"must be positive"}}"#,
    );

    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert_eq!(err.user_message(), "Invalid bill");
    let fields = err.field_errors();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].field, "amount");
    assert_eq!(fields[0].message, "must be positive");
}

#[test]
fn given_unusual_status_when_rejected_then_server_error_with_fallback_message() {
    let (guard, _, _) = guard_with(None);

    let err = guard.reject(409, "");

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.user_message(), "Request failed with HTTP 409");
}

#[test]
fn given_admin_token_when_403_classified_then_diagnostic_reports_admin() {
    // GIVEN: An admin token and a bare 403
    let token = RedactedToken::new(ADMIN_TOKEN);

    // WHEN: Classifying without a guard
    let err = classify(403, ErrorBody::Empty, Some(&token));

    // THEN: Forbidden, but not blamed on a missing admin role
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    match err {
        crate::error::ApiError::Forbidden { diagnostic, .. } => {
            let diagnostic = diagnostic.unwrap();
            assert!(!diagnostic.lacks_admin);
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn given_401_when_classified_then_no_side_effects_needed() {
    let err = classify(401, ErrorBody::Empty, None);

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}
