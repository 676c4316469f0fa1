use estate::cli::{Command, ExportArgs, GetArgs};
use estate::commands::{Context, execute};

use estate_client::SessionState;
use estate_client::config::EstateConfig;

use tempfile::{TempDir, tempdir};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// End-to-end command runs against a mocked backend
// The config directory is a fresh temp dir pointing `api.base_url` at the mock
// ============================================================================

/// Token whose payload is `{"role":"ROLE_USER"}`.
const USER_TOKEN: &str = "abc.eyJyb2xlIjoiUk9MRV9VU0VSIn0.sig";

async fn signed_in_context(server: &MockServer) -> (TempDir, Context) {
    let dir = tempdir().unwrap();
    let mut config = EstateConfig::default();
    config.api.base_url = Some(format!("{}/api/", server.uri()));
    config.export.download_dir = Some(dir.path().join("downloads"));
    config.save(dir.path()).unwrap();

    let context = Context::load(dir.path()).unwrap();
    execute(&context, Command::Login { token: USER_TOKEN.to_string() })
        .await
        .unwrap();
    (dir, context)
}

/// **VALUE**: Tests the whole path from command to pretty-printed JSON.
///
/// **BUG THIS CATCHES**: Would catch query pairs or the bearer token being lost
/// between the CLI arguments and the HTTP request.
#[tokio::test]
async fn given_get_command_when_executed_then_prints_json_body() {
    // GIVEN: A buildings endpoint that requires the session token
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/buildings"))
        .and(query_param("search", "oak"))
        .and(header("authorization", format!("Bearer {USER_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "name": "Oak Court"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let (_dir, context) = signed_in_context(&server).await;

    // WHEN
    let output = execute(
        &context,
        Command::Get(GetArgs {
            path: String::from("/buildings"),
            query: vec![(String::from("search"), String::from("oak"))],
        }),
    )
    .await
    .unwrap();

    // THEN
    let printed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(printed[0]["name"], "Oak Court");
}

/// **VALUE**: A 401 from any command ends the persisted session.
///
/// **WHY THIS MATTERS**: The next command must not keep sending a token the server
/// already rejected.
#[tokio::test]
async fn given_unauthorized_response_when_get_then_session_cleared_on_disk() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tenants"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let (dir, context) = signed_in_context(&server).await;

    // WHEN
    let result = execute(
        &context,
        Command::Get(GetArgs {
            path: String::from("tenants"),
            query: Vec::new(),
        }),
    )
    .await;

    // THEN
    assert!(result.is_err());
    let reloaded = Context::load(dir.path()).unwrap();
    assert_eq!(reloaded.session.state(), SessionState::LoggedOut);
}

/// **VALUE**: The batch report names what was deleted before the failure.
///
/// **BUG THIS CATCHES**: Would catch deletes running after a failure, or the
/// partial result being hidden behind a single error line.
#[tokio::test]
async fn given_second_delete_fails_when_batch_run_then_third_not_attempted() {
    // GIVEN: apartments/1 deletes, apartments/2 is refused, apartments/3 must not be hit
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/apartments/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/apartments/2"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"message": "Apartment has active lease"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/apartments/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    let (_dir, context) = signed_in_context(&server).await;

    // WHEN
    let err = execute(
        &context,
        Command::Delete {
            paths: vec![
                String::from("apartments/1"),
                String::from("apartments/2"),
                String::from("apartments/3"),
            ],
        },
    )
    .await
    .unwrap_err();

    // THEN
    let message = err.user_message();
    assert!(message.contains("1 item(s) processed, 1 failed, 1 not attempted"), "{message}");
    assert!(message.contains("deleted: apartments/1"), "{message}");
    assert!(message.contains("failed: apartments/2"), "{message}");
    assert!(message.contains("skipped: apartments/3"), "{message}");
    assert!(message.contains("Apartment has active lease"), "{message}");
}

#[tokio::test]
async fn given_all_deletes_succeed_when_batch_run_then_summary_only() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    let (_dir, context) = signed_in_context(&server).await;

    let output = execute(
        &context,
        Command::Delete {
            paths: vec![String::from("owners/4"), String::from("owners/5")],
        },
    )
    .await
    .unwrap();

    assert_eq!(output, "2 item(s) processed");
}

/// **VALUE**: Exports land in the download directory under the server's filename.
#[tokio::test]
async fn given_export_command_when_downloaded_then_file_saved_with_disposition_name() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/payments/export"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/csv")
                .insert_header("content-disposition", "attachment; filename=\"payments 2026.csv\"")
                .set_body_bytes(b"id,amount\n1,950\n".to_vec()),
        )
        .mount(&server)
        .await;
    let (dir, context) = signed_in_context(&server).await;

    // WHEN
    let output = execute(
        &context,
        Command::Export(ExportArgs {
            path: String::from("payments/export"),
            query: Vec::new(),
            view: false,
            out_dir: None,
        }),
    )
    .await
    .unwrap();

    // THEN
    let saved = dir.path().join("downloads").join("payments 2026.csv");
    assert_eq!(std::fs::read(&saved).unwrap(), b"id,amount\n1,950\n");
    assert!(output.contains("16 bytes"), "{output}");
}

#[tokio::test]
async fn given_export_failure_when_downloaded_then_generic_export_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/payments/export"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let (dir, context) = signed_in_context(&server).await;

    let err = execute(
        &context,
        Command::Export(ExportArgs {
            path: String::from("payments/export"),
            query: Vec::new(),
            view: false,
            out_dir: Some(dir.path().join("elsewhere")),
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.user_message(), "Export/download failed (HTTP 500)");
    assert!(!dir.path().join("elsewhere").exists());
}
