use crate::helpers::{USER_TOKEN, api_base, harness, unreachable_base};

use estate_client::error::api::NETWORK_ERROR_MESSAGE;
use estate_client::session::{SIGN_IN_PATH, SessionState};
use estate_client::{ErrorKind, RequestOptions};

use common::RedactedToken;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Apartment {
    id: u64,
    code: String,
}

/// **VALUE**: Verifies the whole happy path: header injection, JSON decoding, query params.
///
/// **WHY THIS MATTERS**: Every list screen is exactly this call.
#[tokio::test]
async fn given_token_when_get_then_bearer_sent_and_json_decoded() {
    // GIVEN: A backend that requires the bearer token
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/apartments"))
        .and(header("authorization", format!("Bearer {USER_TOKEN}").as_str()))
        .and(query_param("search", "river"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "code": "A-101"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    // WHEN: Listing apartments
    let apartments: Vec<Apartment> = h
        .client
        .get("/apartments", RequestOptions::new().query("search", "river"))
        .await
        .unwrap();

    // THEN: Decoded payload
    assert_eq!(
        apartments,
        vec![Apartment {
            id: 1,
            code: String::from("A-101")
        }]
    );
}

#[tokio::test]
async fn given_no_token_when_get_then_request_proceeds_without_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;
    let h = harness(api_base(&server), None);

    let body: Value = h.client.get("notices", RequestOptions::new()).await.unwrap();

    assert_eq!(body, json!({"items": []}));
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn given_json_body_when_post_then_body_and_content_type_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bills"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"apartmentId": 1, "amount": 120})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 77})))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    let created: Value = h
        .client
        .post("bills", &json!({"apartmentId": 1, "amount": 120}), RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(created["id"], 77);
}

#[tokio::test]
async fn given_empty_success_body_when_delete_then_unit() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/invoices/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    let result: Result<(), _> = h.client.delete("invoices/9", RequestOptions::new()).await;

    assert!(result.is_ok());
}

/// **VALUE**: Verifies the 401 scenario end to end.
///
/// **BUG THIS CATCHES**: Would catch the guard being bypassed on the real response path, or
/// the redirect firing more than once.
#[tokio::test]
async fn given_token_when_401_then_logged_out_and_redirected_once() {
    // GIVEN: An expired token
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/contributions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Token expired"))
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    // WHEN: Any call hits 401
    let err = h
        .client
        .get::<Value>("contributions", RequestOptions::new())
        .await
        .unwrap_err();

    // THEN: Token gone, one redirect, caller still gets the error
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(h.session.state(), SessionState::LoggedOut);
    assert_eq!(h.navigator.redirects(), vec![SIGN_IN_PATH.to_string()]);
}

#[tokio::test]
async fn given_user_token_when_403_then_admin_message_and_token_kept() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/3"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "Access is denied"})),
        )
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    let err = h
        .client
        .delete::<()>("users/3", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(err.user_message().contains("Admin privilege required"));
    assert_eq!(h.session.token().unwrap().expose(), USER_TOKEN);
    assert!(h.navigator.redirects().is_empty());
}

#[tokio::test]
async fn given_500_when_called_then_server_body_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/apartments/1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "Constraint violation"})),
        )
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    let err = h
        .client
        .put::<_, Value>("apartments/1", &json!({"code": "A-1"}), RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.user_message(), "Constraint violation");
    assert_eq!(h.session.state(), SessionState::Authenticated);
}

/// **VALUE**: Verifies that network failures always show the generic message.
///
/// **WHY THIS MATTERS**: Raw transport errors ("error sending request for url ...
/// tcp connect error") are meaningless to a building manager.
#[tokio::test]
async fn given_unreachable_server_when_called_then_generic_network_message() {
    // GIVEN: Nothing listening
    let h = harness(unreachable_base(), Some(USER_TOKEN));

    // WHEN: Calling
    let err = h
        .client
        .get::<Value>("apartments", RequestOptions::new())
        .await
        .unwrap_err();

    // THEN: Network kind, generic text, session untouched
    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
    assert_eq!(err.status_code(), None);
    assert_eq!(h.session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn given_require_auth_without_token_when_called_then_nothing_sent() {
    let server = MockServer::start().await;
    let h = harness(api_base(&server), None);

    let err = h
        .client
        .delete::<()>("bills/4", RequestOptions::new().require_auth())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ClientError);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn given_malformed_success_body_when_decoded_then_decode_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    let err = h
        .client
        .get::<Vec<Apartment>>("users", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert!(!err.user_message().is_empty());
}

/// **VALUE**: A body that cannot be serialized is reported as a local failure.
///
/// **WHY THIS MATTERS**: Telling the user the server is unreachable when nothing was ever
/// sent sends them chasing a network problem that does not exist.
///
/// **BUG THIS CATCHES**: Would catch builder errors from reqwest being classified as
/// transport failures.
#[tokio::test]
async fn given_unserializable_body_when_post_then_client_error_and_nothing_sent() {
    // GIVEN: A body type that refuses serialization
    let server = MockServer::start().await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    // WHEN: Posting it
    let err = h
        .client
        .post::<_, Value>("bills", &RedactedToken::new("secret"), RequestOptions::new())
        .await
        .unwrap_err();

    // THEN: Client error with the real reason, no request on the wire
    assert_eq!(err.kind(), ErrorKind::ClientError);
    assert_ne!(err.user_message(), NETWORK_ERROR_MESSAGE);
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// **VALUE**: A response that arrives but is cut short is not "server unreachable".
///
/// **BUG THIS CATCHES**: Would catch body read failures after a 2xx going through the
/// transport mapping.
#[tokio::test]
async fn given_truncated_success_body_when_read_then_decode_error_not_network() {
    // GIVEN: A server that promises 100 bytes and closes after 2
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n[]")
            .await
            .unwrap();
        socket.shutdown().await.ok();
    });
    let base = Url::parse(&format!("http://127.0.0.1:{port}/api/")).unwrap();
    let h = harness(base, Some(USER_TOKEN));

    // WHEN
    let err = h
        .client
        .get::<Value>("apartments", RequestOptions::new())
        .await
        .unwrap_err();

    // THEN
    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert!(err.user_message().starts_with("Failed to read response body"));
}
