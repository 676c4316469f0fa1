use crate::RedactedToken;

/// **VALUE**: Verifies the token never shows up in `{:?}` or `{}` output.
///
/// **WHY THIS MATTERS**: The session guard logs every failure. A token leaking into a log
/// file is a credential leak.
#[test]
fn given_token_when_formatted_then_value_is_hidden() {
    // GIVEN: A token
    let token = RedactedToken::new("abc.eyJyb2xlIjoiUk9MRV9VU0VSIn0.sig");

    // WHEN: Formatting both ways
    let debug = format!("{token:?}");
    let display = format!("{token}");

    // THEN: Neither contains the raw value
    assert!(!debug.contains("eyJ"));
    assert!(!display.contains("eyJ"));
    assert_eq!(token.expose(), "abc.eyJyb2xlIjoiUk9MRV9VU0VSIn0.sig");
}

#[test]
fn given_token_when_serialized_then_refuses() {
    let token = RedactedToken::new("secret");

    let result = serde_json::to_string(&token);

    assert!(result.is_err(), "Serialization must be refused");
    let message = result.unwrap_err().to_string();
    assert!(message.contains("cannot be serialized"));
}

#[test]
fn given_whitespace_token_when_checked_then_is_empty() {
    assert!(RedactedToken::new("   ").is_empty());
    assert!(!RedactedToken::new("t").is_empty());
}
