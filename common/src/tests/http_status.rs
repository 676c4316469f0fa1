use crate::HttpStatusCode;

#[test]
fn given_status_codes_when_categorised_then_ranges_match() {
    assert!(HttpStatusCode(204).is_success());
    assert!(!HttpStatusCode(302).is_success());
    assert!(!HttpStatusCode::UNAUTHORIZED.is_server_error());
    assert!(HttpStatusCode(500).is_server_error());
    assert!(!HttpStatusCode(499).is_server_error());
}

#[test]
fn given_form_rejection_statuses_when_checked_then_only_400_and_422_are_validation() {
    assert!(HttpStatusCode(400).is_validation_error());
    assert!(HttpStatusCode(422).is_validation_error());
    assert!(!HttpStatusCode(401).is_validation_error());
    assert!(!HttpStatusCode(409).is_validation_error());
}
