//! Best-effort decoding of the session token payload.
//!
//! The payload is never verified here. It only feeds the diagnostic shown when the
//! backend answers 403, so a token that fails to decode simply yields no diagnostic.

use common::RedactedToken;

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use log::debug;
use serde_json::Value;

/// Role marker the backend grants administrators.
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

/// Claims read from a JWT payload segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: Option<String>,
    pub roles: Vec<String>,
    pub expires_at: Option<i64>,
}

impl TokenClaims {
    /// Collects roles from `role`, `roles` and `authorities`, accepting plain strings
    /// as well as `{"authority": "..."}` objects.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let object = payload.as_object()?;

        let mut roles = Vec::new();
        for key in ["role", "roles", "authorities", "scope"] {
            match object.get(key) {
                Some(Value::String(role)) => {
                    roles.extend(role.split_whitespace().map(str::to_string))
                }
                Some(Value::Array(items)) => roles.extend(items.iter().filter_map(|item| {
                    item.as_str()
                        .or_else(|| item.get("authority").and_then(Value::as_str))
                        .map(str::to_string)
                })),
                _ => {}
            }
        }

        Some(Self {
            subject: object.get("sub").and_then(Value::as_str).map(str::to_string),
            roles,
            expires_at: object.get("exp").and_then(Value::as_i64),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| {
            role.eq_ignore_ascii_case(ADMIN_ROLE) || role.eq_ignore_ascii_case("ADMIN")
        })
    }
}

/// Decode the middle segment of `header.payload.signature`.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let segment = token.split('.').nth(1)?;
    let bytes = match URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Token payload is not base64url: {e}");
            return None;
        }
    };
    let payload: Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("Token payload is not JSON: {e}");
            return None;
        }
    };
    TokenClaims::from_payload(&payload)
}

/// What the token says about the caller's privilege when a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeDiagnostic {
    pub roles: Vec<String>,
    pub lacks_admin: bool,
}

impl PrivilegeDiagnostic {
    pub fn from_token(token: &RedactedToken) -> Option<Self> {
        let claims = decode_claims(token.expose())?;
        Some(Self {
            lacks_admin: !claims.is_admin(),
            roles: claims.roles,
        })
    }
}

impl fmt::Display for PrivilegeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles = if self.roles.is_empty() {
            "none".to_string()
        } else {
            self.roles.join(", ")
        };
        if self.lacks_admin {
            write!(f, "current role: {roles}")
        } else {
            write!(f, "roles: {roles}")
        }
    }
}
