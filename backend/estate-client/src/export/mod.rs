//! Binary exports (spreadsheets, PDFs, Word documents).
//!
//! Exports go through a plain request rather than [`ApiClient`](crate::api_client::ApiClient):
//! the body is bytes, not JSON, and a failed export is reported as a single
//! "export/download failed" error carrying the status.

pub mod blob;
pub mod filename;

pub use blob::{Blob, BlobSink, DEFAULT_CONTENT_TYPE, DirectorySink, ObjectUrl, VIEW_RETENTION};
pub use filename::{default_filename, filename_from_content_disposition};

use crate::error::ApiError;
use crate::interceptor::RequestInterceptor;
use crate::session::Session;

use common::HttpStatusCode;

use std::path::PathBuf;
use std::time::Duration;

use log::{error, info};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderName};
use reqwest::{Client, Response};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Save-as into the sink.
    Download,
    /// Open inline in a viewer.
    View,
}

/// A fetched file before it is handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub blob: Blob,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved {
        path: PathBuf,
        filename: String,
        size: usize,
    },
    /// `path` is the copy handed to the viewer.
    Viewed {
        path: PathBuf,
        filename: String,
        size: usize,
    },
}

#[derive(Clone)]
pub struct Exporter {
    base_url: Url,
    client: Client,
    interceptor: RequestInterceptor,
}

impl Exporter {
    pub fn new(
        base_url: Url,
        session: Session,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url,
            client: builder.build()?,
            interceptor: RequestInterceptor::new(session),
        })
    }

    /// GET the file with the bearer token attached.
    pub async fn fetch(&self, path: &str, query: &[(String, String)]) -> Result<Download, ApiError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let target = format!("GET {}", url.path());

        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let request = self.interceptor.authorize(request, false, &target)?;

        let response = request.send().await.map_err(|e| {
            let err = ApiError::from_transport(&e);
            error!("Export {target} got no response: {err}");
            err
        })?;

        let status = HttpStatusCode(response.status().as_u16());
        if !status.is_success() {
            error!("Export {target} failed with HTTP {status}");
            return Err(ApiError::export_failed(status.0));
        }

        let content_type = header_text(&response, CONTENT_TYPE);
        let disposition = header_text(&response, CONTENT_DISPOSITION);

        let bytes = response.bytes().await.map_err(|e| {
            let err = ApiError::from_body_read(&e);
            error!("Export {target} body unreadable: {err}");
            err
        })?;
        let blob = Blob::new(bytes.to_vec(), content_type.as_deref());
        let filename = disposition
            .as_deref()
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| default_filename(&blob.content_type));

        info!("Fetched {filename} ({} bytes, {})", blob.len(), blob.content_type);
        Ok(Download { filename, blob })
    }

    /// Fetch then save or view. The temporary object is released before returning,
    /// whether the sink succeeded or not.
    pub async fn export(
        &self,
        path: &str,
        query: &[(String, String)],
        mode: ExportMode,
        sink: &dyn BlobSink,
    ) -> Result<ExportOutcome, ApiError> {
        let Download { filename, blob } = self.fetch(path, query).await?;
        let size = blob.len();

        let object_name = filename.clone();
        let object = tokio::task::spawn_blocking(move || ObjectUrl::create(&blob, &object_name))
            .await
            .map_err(std::io::Error::other)??;
        let outcome = match mode {
            ExportMode::Download => {
                sink.save(&object, &filename)
                    .await
                    .map(|path| ExportOutcome::Saved {
                        path,
                        filename: filename.clone(),
                        size,
                    })
            }
            ExportMode::View => {
                sink.open(&object, &filename)
                    .await
                    .map(|path| ExportOutcome::Viewed {
                        path,
                        filename: filename.clone(),
                        size,
                    })
            }
        };
        drop(object);

        outcome.map_err(|e| {
            let err = ApiError::from(e);
            error!("Export of {filename} failed: {err}");
            err
        })
    }
}

/// Header value as text. Servers often send raw UTF-8 filenames, which
/// `HeaderValue::to_str` rejects.
fn header_text(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}
