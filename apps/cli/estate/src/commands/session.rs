use super::Context;
use crate::error::EstateError;

use estate_client::SessionState;
use estate_client::claims::decode_claims;

pub fn login(context: &Context, token: &str) -> Result<String, EstateError> {
    context.session.sign_in(token)?;
    Ok(String::from("Signed in."))
}

pub fn logout(context: &Context) -> Result<String, EstateError> {
    context.session.sign_out()?;
    Ok(String::from("Signed out."))
}

pub fn status(context: &Context) -> Result<String, EstateError> {
    let base_url = context.config.resolve_base_url()?;

    let mut lines = vec![format!("API: {base_url}")];
    match (context.session.state(), context.session.token()) {
        (SessionState::Authenticated, Some(token)) => {
            lines.push(String::from("Session: authenticated"));
            match decode_claims(token.expose()) {
                Some(claims) => {
                    if let Some(subject) = claims.subject {
                        lines.push(format!("User: {subject}"));
                    }
                    let roles = if claims.roles.is_empty() {
                        String::from("none")
                    } else {
                        claims.roles.join(", ")
                    };
                    lines.push(format!("Roles: {roles}"));
                }
                None => lines.push(String::from("Roles: unknown (token payload not readable)")),
            }
        }
        _ => lines.push(String::from("Session: logged out")),
    }
    Ok(lines.join("\n"))
}

pub fn store_targets(context: &Context, user_ids: &[String]) -> Result<String, EstateError> {
    context.session.notification_targets().store(user_ids)?;
    Ok(format!("Stored {} notification target(s).", user_ids.len()))
}

pub fn take_targets(context: &Context) -> Result<String, EstateError> {
    let ids = context.session.notification_targets().take()?;
    if ids.is_empty() {
        return Ok(String::from("No notification targets stored."));
    }
    Ok(ids.join("\n"))
}
