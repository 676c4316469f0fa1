//! The shared JSON client every screen calls through.

use crate::config::EstateConfig;
use crate::error::{ApiError, CoreError};
use crate::export::Exporter;
use crate::interceptor::{RequestInterceptor, SessionGuard};
use crate::session::{Navigator, Session};

use std::sync::Arc;

use log::{debug, error};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Per-call extras: query parameters, headers, and whether a token is mandatory.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    query: Vec<(String, String)>,
    headers: HeaderMap,
    require_auth: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Fail with a client error instead of sending when no token is stored.
    pub fn require_auth(mut self) -> Self {
        self.require_auth = true;
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
    session: Session,
    interceptor: RequestInterceptor,
    guard: SessionGuard,
    config: EstateConfig,
}

impl ApiClient {
    /// Build the client from config, resolving the base URL from the environment.
    pub fn new(
        config: &EstateConfig,
        session: Session,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, CoreError> {
        let base_url = config.resolve_base_url()?;
        Ok(Self::with_base_url(base_url, config, session, navigator)?)
    }

    pub fn with_base_url(
        base_url: Url,
        config: &EstateConfig,
        session: Session,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        default_headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            interceptor: RequestInterceptor::new(session.clone()),
            guard: SessionGuard::new(
                session.clone(),
                navigator,
                config.session.sign_in_path.clone(),
            ),
            base_url,
            client,
            session,
            config: config.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Raw-fetch helper for binary downloads, sharing this client's session.
    pub fn exporter(&self) -> Result<Exporter, ApiError> {
        Exporter::new(
            self.base_url.clone(),
            self.session.clone(),
            self.config.timeout(),
        )
    }

    /// Resolve a path against the base URL. A leading `/` is ignored so paths
    /// always stay beneath the API prefix.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.execute(Method::GET, path, None::<&()>, options).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(body), options).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, options: RequestOptions) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::PUT, path, Some(body), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.execute(Method::DELETE, path, None::<&()>, options).await
    }

    async fn execute<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let target = format!("{method} {}", url.path());

        let mut request = self.client.request(method, url);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if !options.headers.is_empty() {
            request = request.headers(options.headers);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let request = self
            .interceptor
            .authorize(request, options.require_auth, &target)?;

        debug!("Sending {target}");
        let response = self.guard.inspect(request.send().await).await?;

        let bytes = response.bytes().await.map_err(|e| {
            let err = ApiError::from_body_read(&e);
            error!("Failed to read response of {target}: {err}");
            err
        })?;
        let decoded = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&bytes)
        };

        decoded.map_err(|e| {
            let err = ApiError::from(e);
            error!("Failed to decode response of {target}: {err}");
            err
        })
    }
}
