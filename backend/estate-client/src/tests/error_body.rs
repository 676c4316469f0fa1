use crate::interceptor::{ErrorBody, FieldError, parse_error_body};

use serde_json::json;

#[test]
fn given_json_body_when_parsed_then_message_field_is_used() {
    let body = parse_error_body(r#"{"status":404,"message":"Apartment not found"}"#);

    assert_eq!(body, ErrorBody::Json(json!({"status":404,"message":"Apartment not found"})));
    assert_eq!(body.message().as_deref(), Some("Apartment not found"));
}

#[test]
fn given_plain_text_when_parsed_then_wrapped_as_text() {
    let body = parse_error_body("  Internal failure  \n");

    assert_eq!(body, ErrorBody::Text(String::from("Internal failure")));
    assert_eq!(body.message_or("fallback"), "Internal failure");
}

#[test]
fn given_blank_or_null_body_when_parsed_then_empty() {
    assert_eq!(parse_error_body(""), ErrorBody::Empty);
    assert_eq!(parse_error_body("   "), ErrorBody::Empty);
    assert_eq!(parse_error_body("null"), ErrorBody::Empty);
    assert_eq!(parse_error_body("").message_or("fallback"), "fallback");
}

#[test]
fn given_json_without_message_keys_when_read_then_falls_through_keys_then_raw() {
    assert_eq!(
        parse_error_body(r#"{"error":"Bad Request","message":""}"#).message().as_deref(),
        Some("Bad Request")
    );
    assert_eq!(
        parse_error_body(r#"{"code":7}"#).message().as_deref(),
        Some(r#"{"code":7}"#)
    );
    assert_eq!(
        parse_error_body(r#""quoted text""#).message().as_deref(),
        Some("quoted text")
    );
}

#[test]
fn given_spring_style_error_list_when_read_then_field_errors_extracted() {
    let body = parse_error_body(
        r#"{"errors":[{"field":"email","defaultMessage":"must be a well-formed email"},{"field":"name","message":"required"},{"objectName":"user"}]}"#,
    );

    assert_eq!(
        body.field_errors(),
        vec![
            FieldError {
                field: String::from("email"),
                message: String::from("must be a well-formed email"),
            },
            FieldError {
                field: String::from("name"),
                message: String::from("required"),
            },
        ]
    );
}

#[test]
fn given_map_of_lists_when_read_then_one_error_per_message() {
    let body = parse_error_body(r#"{"errors":{"floor":["required","must be a number"]}}"#);

    let fields = body.field_errors();

    assert_eq!(fields.len(), 2);
    assert!(fields.iter().all(|f| f.field == "floor"));
}

#[test]
fn given_text_body_when_field_errors_requested_then_empty() {
    assert!(parse_error_body("nope").field_errors().is_empty());
}
