// Commands that only touch local state; network-backed ones live in integration_tests

use crate::cli::{Command, NotifyTargetsCommand};
use crate::commands::{Context, execute};

use estate_client::SessionState;
use estate_client::config::EstateConfig;
use estate_client::storage::TOKEN_KEY;

use std::path::PathBuf;

use tempfile::{TempDir, tempdir};

/// Token whose payload is `{"sub":"admin","role":"ROLE_ADMIN"}`.
const ADMIN_TOKEN: &str = "abc.eyJzdWIiOiJhZG1pbiIsInJvbGUiOiJST0xFX0FETUlOIn0.sig";

fn context() -> (TempDir, Context) {
    let dir = tempdir().unwrap();
    let context = Context::load(dir.path()).unwrap();
    (dir, context)
}

/// **VALUE**: A login survives the process, like the browser's local storage.
///
/// **BUG THIS CATCHES**: Would catch the CLI wiring a memory-only store.
#[tokio::test]
async fn given_login_when_context_reloaded_then_still_authenticated() {
    // GIVEN: A fresh config directory
    let (dir, context) = context();
    assert_eq!(context.session.state(), SessionState::LoggedOut);

    // WHEN: Logging in and loading a second context from the same directory
    let output = execute(&context, Command::Login { token: ADMIN_TOKEN.to_string() })
        .await
        .unwrap();
    let reloaded = Context::load(dir.path()).unwrap();

    // THEN: The token was persisted under the shared key
    assert_eq!(output, "Signed in.");
    assert_eq!(reloaded.session.state(), SessionState::Authenticated);
    let stored = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
    assert!(stored.contains(TOKEN_KEY));
}

#[tokio::test]
async fn given_admin_token_when_status_then_roles_listed() {
    // GIVEN
    let (_dir, context) = context();
    execute(&context, Command::Login { token: ADMIN_TOKEN.to_string() })
        .await
        .unwrap();

    // WHEN
    let output = execute(&context, Command::Status).await.unwrap();

    // THEN
    assert!(output.contains("Session: authenticated"), "{output}");
    assert!(output.contains("User: admin"), "{output}");
    assert!(output.contains("Roles: ROLE_ADMIN"), "{output}");
    assert!(!output.contains(ADMIN_TOKEN), "status must not print the token");
}

#[tokio::test]
async fn given_logout_when_status_then_logged_out() {
    let (_dir, context) = context();
    execute(&context, Command::Login { token: ADMIN_TOKEN.to_string() })
        .await
        .unwrap();

    execute(&context, Command::Logout).await.unwrap();
    let output = execute(&context, Command::Status).await.unwrap();

    assert!(output.contains("Session: logged out"), "{output}");
}

#[tokio::test]
async fn given_blank_token_when_login_then_error_and_still_logged_out() {
    let (_dir, context) = context();

    let result = execute(&context, Command::Login { token: String::from("  ") }).await;

    assert!(result.is_err());
    assert_eq!(context.session.state(), SessionState::LoggedOut);
}

/// **VALUE**: The selection handed to the notification screen is read exactly once.
///
/// **BUG THIS CATCHES**: Would catch `take` leaving the ids behind, so a later
/// notification silently reuses an old selection.
#[tokio::test]
async fn given_stored_targets_when_taken_twice_then_second_is_empty() {
    // GIVEN
    let (_dir, context) = context();
    let store = NotifyTargetsCommand::Store {
        user_ids: vec![String::from("7"), String::from("12")],
    };
    let stored = execute(&context, Command::NotifyTargets(store)).await.unwrap();

    // WHEN
    let first = execute(&context, Command::NotifyTargets(NotifyTargetsCommand::Take))
        .await
        .unwrap();
    let second = execute(&context, Command::NotifyTargets(NotifyTargetsCommand::Take))
        .await
        .unwrap();

    // THEN
    assert_eq!(stored, "Stored 2 notification target(s).");
    assert_eq!(first, "7\n12");
    assert_eq!(second, "No notification targets stored.");
}

#[test]
fn given_configured_download_dir_when_resolved_then_used() {
    // GIVEN: A config that names a download directory
    let dir = tempdir().unwrap();
    let mut config = EstateConfig::default();
    config.export.download_dir = Some(PathBuf::from("/srv/exports"));
    config.save(dir.path()).unwrap();

    // WHEN
    let context = Context::load(dir.path()).unwrap();

    // THEN
    assert_eq!(context.download_dir(), PathBuf::from("/srv/exports"));
}
