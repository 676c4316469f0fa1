//! Error bodies arrive as JSON from most endpoints and as plain text from a few.
//!
//! [`parse_error_body`] tries JSON first and falls back to wrapping the raw text,
//! so the guard never fails while reading a failure.

use serde_json::Value;

/// Keys checked, in order, for a human-readable message in a JSON error body.
const MESSAGE_KEYS: [&str; 4] = ["message", "error", "detail", "title"];

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Empty,
    Json(Value),
    Text(String),
}

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

pub fn parse_error_body(raw: &str) -> ErrorBody {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ErrorBody::Empty;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Null) => ErrorBody::Empty,
        Ok(value) => ErrorBody::Json(value),
        Err(_) => ErrorBody::Text(trimmed.to_string()),
    }
}

impl ErrorBody {
    /// The most specific message the body carries, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            ErrorBody::Empty => None,
            ErrorBody::Text(text) => Some(text.clone()),
            ErrorBody::Json(Value::String(text)) => Some(text.clone()),
            ErrorBody::Json(Value::Object(map)) => MESSAGE_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|value| match value {
                    Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
                    _ => None,
                })
                .or_else(|| Some(Value::Object(map.clone()).to_string())),
            ErrorBody::Json(other) => Some(other.to_string()),
        }
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message().unwrap_or_else(|| fallback.to_string())
    }

    /// Field errors in either of the shapes the backend emits:
    /// `{"errors": {"name": "must not be blank"}}` (string or list of strings per field)
    /// or `{"errors": [{"field": "name", "defaultMessage": "must not be blank"}]}`.
    pub fn field_errors(&self) -> Vec<FieldError> {
        let ErrorBody::Json(Value::Object(map)) = self else {
            return Vec::new();
        };

        match map.get("errors") {
            Some(Value::Object(fields)) => fields
                .iter()
                .flat_map(|(field, value)| {
                    let messages: Vec<String> = match value {
                        Value::String(text) => vec![text.clone()],
                        Value::Array(items) => items
                            .iter()
                            .filter_map(|item| item.as_str().map(str::to_string))
                            .collect(),
                        other => vec![other.to_string()],
                    };
                    messages.into_iter().map(move |message| FieldError {
                        field: field.clone(),
                        message,
                    })
                })
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    let field = item.get("field")?.as_str()?;
                    let message = item
                        .get("message")
                        .or_else(|| item.get("defaultMessage"))
                        .and_then(Value::as_str)
                        .unwrap_or("invalid value");
                    Some(FieldError {
                        field: field.to_string(),
                        message: message.to_string(),
                    })
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}
