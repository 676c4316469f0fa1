//! Test helpers for integration tests against a mocked backend.

use estate_client::config::EstateConfig;
use estate_client::session::{Navigator, SIGN_IN_PATH};
use estate_client::storage::MemoryStorage;
use estate_client::{ApiClient, Session};

use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use url::Url;
use wiremock::MockServer;

/// Token whose payload is `{"role":"ROLE_USER"}`.
pub const USER_TOKEN: &str = "abc.eyJyb2xlIjoiUk9MRV9VU0VSIn0.sig";

#[derive(Clone, Default)]
pub struct RecordingNavigator {
    redirects: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.redirects.lock().unwrap().push(path.to_string());
    }
}

pub struct Harness {
    pub client: ApiClient,
    pub session: Session,
    pub navigator: RecordingNavigator,
}

pub fn api_base(server: &MockServer) -> Url {
    Url::parse(&format!("{}/api/", server.uri())).unwrap()
}

/// Client pointed at `base_url`, optionally signed in.
pub fn harness(base_url: Url, token: Option<&str>) -> Harness {
    let session = Session::new(Arc::new(MemoryStorage::new()));
    if let Some(token) = token {
        session.sign_in(token).unwrap();
    }
    let navigator = RecordingNavigator::default();
    let config = EstateConfig::default();
    assert_eq!(config.session.sign_in_path, SIGN_IN_PATH);

    let client = ApiClient::with_base_url(
        base_url,
        &config,
        session.clone(),
        Arc::new(navigator.clone()),
    )
    .unwrap();

    Harness {
        client,
        session,
        navigator,
    }
}

/// A base URL nothing listens on.
pub fn unreachable_base() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}/api/")).unwrap()
}
