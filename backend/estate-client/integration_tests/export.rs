use crate::helpers::{USER_TOKEN, api_base, harness, unreachable_base};

use estate_client::ErrorKind;
use estate_client::export::{
    BlobSink, DEFAULT_CONTENT_TYPE, DirectorySink, ExportMode, ExportOutcome, ObjectUrl,
    VIEW_RETENTION,
};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tempfile::tempdir;
use reqwest::header::HeaderValue;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Sink that records what it was handed, including where the object lived.
#[derive(Clone, Default)]
struct RecordingSink {
    seen: Arc<Mutex<Vec<(PathBuf, String, Vec<u8>)>>>,
    opened: Arc<Mutex<usize>>,
    fail: bool,
}

#[async_trait]
impl BlobSink for RecordingSink {
    async fn save(&self, object: &ObjectUrl, filename: &str) -> Result<PathBuf, std::io::Error> {
        let bytes = std::fs::read(object.path())?;
        self.seen.lock().unwrap().push((
            object.path().to_path_buf(),
            filename.to_string(),
            bytes,
        ));
        if self.fail {
            return Err(std::io::Error::other("disk full"));
        }
        Ok(PathBuf::from("/downloads").join(filename))
    }

    async fn open(&self, object: &ObjectUrl, filename: &str) -> Result<PathBuf, std::io::Error> {
        assert!(object.path().exists());
        assert_eq!(object.content_type(), "application/pdf");
        *self.opened.lock().unwrap() += 1;
        Ok(PathBuf::from("/viewer").join(filename))
    }
}

/// **VALUE**: Verifies the exact filename from `Content-Disposition` and object cleanup.
///
/// **WHY THIS MATTERS**: Temporary copies of tenant spreadsheets must not pile up on disk.
#[tokio::test]
async fn given_disposition_header_when_downloaded_then_exact_name_and_object_released() {
    // GIVEN: An export endpoint with a filename
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/apartments/export"))
        .and(header("authorization", format!("Bearer {USER_TOKEN}").as_str()))
        .and(query_param("building", "B"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", XLSX)
                .insert_header("content-disposition", r#"attachment; filename="apartments.xlsx""#)
                .set_body_bytes(b"PK\x03\x04sheet".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));
    let exporter = h.client.exporter().unwrap();
    let sink = RecordingSink::default();

    // WHEN: Downloading
    let outcome = exporter
        .export(
            "apartments/export",
            &[(String::from("building"), String::from("B"))],
            ExportMode::Download,
            &sink,
        )
        .await
        .unwrap();

    // THEN: Saved as apartments.xlsx with the right bytes, temp object gone
    assert_eq!(
        outcome,
        ExportOutcome::Saved {
            path: PathBuf::from("/downloads/apartments.xlsx"),
            filename: String::from("apartments.xlsx"),
            size: 9,
        }
    );
    let seen = sink.seen.lock().unwrap();
    let (object_path, filename, bytes) = &seen[0];
    assert_eq!(filename, "apartments.xlsx");
    assert_eq!(bytes.as_slice(), b"PK\x03\x04sheet");
    assert!(!object_path.exists(), "Object must be released after use");
}

#[tokio::test]
async fn given_view_mode_when_exported_then_opened_not_saved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/5/pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.7".to_vec()),
        )
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));
    let sink = RecordingSink::default();

    let outcome = h
        .client
        .exporter()
        .unwrap()
        .export("invoices/5/pdf", &[], ExportMode::View, &sink)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ExportOutcome::Viewed {
            path: PathBuf::from("/viewer/export.pdf"),
            filename: String::from("export.pdf"),
            size: 8,
        }
    );
    assert_eq!(*sink.opened.lock().unwrap(), 1);
    assert!(sink.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn given_sink_failure_when_exported_then_error_and_object_still_released() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bills/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b\n1,2\n".to_vec()))
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));
    let sink = RecordingSink {
        fail: true,
        ..RecordingSink::default()
    };

    let err = h
        .client
        .exporter()
        .unwrap()
        .export("bills/export", &[], ExportMode::Download, &sink)
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "disk full");
    let seen = sink.seen.lock().unwrap();
    assert!(!seen[0].0.exists());
}

#[tokio::test]
async fn given_non_2xx_when_fetched_then_export_failed_with_status_and_session_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/contributions/export"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no data"))
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    let err = h
        .client
        .exporter()
        .unwrap()
        .fetch("contributions/export", &[])
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Export/download failed (HTTP 404)");
    assert_eq!(err.status_code(), Some(404));
    assert!(h.session.token().is_some());
}

#[tokio::test]
async fn given_no_content_type_when_fetched_then_defaults_applied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    let download = h
        .client
        .exporter()
        .unwrap()
        .fetch("users/export", &[])
        .await
        .unwrap();

    assert_eq!(download.blob.content_type, DEFAULT_CONTENT_TYPE);
    assert_eq!(download.filename, "export.bin");
    assert_eq!(download.blob.bytes, vec![1, 2, 3]);
}

#[tokio::test]
async fn given_unreachable_server_when_fetched_then_network_error() {
    let h = harness(unreachable_base(), Some(USER_TOKEN));

    let err = h
        .client
        .exporter()
        .unwrap()
        .fetch("apartments/export", &[])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkError);
}

#[tokio::test]
async fn given_existing_file_when_directory_sink_saves_then_name_is_suffixed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/apartments/export"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", XLSX)
                .insert_header("content-disposition", "attachment; filename=apartments.xlsx")
                .set_body_bytes(b"v2".to_vec()),
        )
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));
    let downloads = tempdir().unwrap();
    std::fs::write(downloads.path().join("apartments.xlsx"), b"v1").unwrap();
    let sink = DirectorySink::new(downloads.path());

    let outcome = h
        .client
        .exporter()
        .unwrap()
        .export("apartments/export", &[], ExportMode::Download, &sink)
        .await
        .unwrap();

    let expected = downloads.path().join("apartments (1).xlsx");
    assert_eq!(
        outcome,
        ExportOutcome::Saved {
            path: expected.clone(),
            filename: String::from("apartments.xlsx"),
            size: 2,
        }
    );
    assert_eq!(std::fs::read(expected).unwrap(), b"v2");
    assert_eq!(std::fs::read(downloads.path().join("apartments.xlsx")).unwrap(), b"v1");
}

/// **VALUE**: Raw UTF-8 filenames survive, as browsers accept them.
///
/// **BUG THIS CATCHES**: Would catch non-ASCII header bytes being discarded, which
/// silently renames every invoice to `export.xlsx`.
#[tokio::test]
async fn given_raw_utf8_disposition_when_fetched_then_filename_kept() {
    // GIVEN: A Content-Disposition header carrying unencoded UTF-8
    let server = MockServer::start().await;
    let disposition = HeaderValue::from_bytes("attachment; filename=\"hóa đơn.xlsx\"".as_bytes()).unwrap();
    Mock::given(method("GET"))
        .and(path("/api/invoices/export"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", XLSX)
                .insert_header("content-disposition", disposition)
                .set_body_bytes(b"PK".to_vec()),
        )
        .mount(&server)
        .await;
    let h = harness(api_base(&server), Some(USER_TOKEN));

    // WHEN
    let download = h
        .client
        .exporter()
        .unwrap()
        .fetch("invoices/export", &[])
        .await
        .unwrap();

    // THEN
    assert_eq!(download.filename, "hóa đơn.xlsx");
}

async fn pdf_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/9/pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .insert_header("content-disposition", "inline; filename=invoice-9.pdf")
                .set_body_bytes(b"%PDF-1.7".to_vec()),
        )
        .mount(&server)
        .await;
    server
}

/// **VALUE**: The viewer still finds the file after the export call returns.
///
/// **WHY THIS MATTERS**: `xdg-open` hands the file to the viewer and exits at once; the
/// viewer reads it afterwards.
///
/// **BUG THIS CATCHES**: Would catch the viewer being given the temporary object, which
/// is deleted as soon as the export returns.
#[cfg(unix)]
#[tokio::test]
async fn given_viewer_that_returns_immediately_when_viewed_then_file_still_readable() {
    // GIVEN: A directory sink whose viewer exits straight away
    let server = pdf_server().await;
    let h = harness(api_base(&server), Some(USER_TOKEN));
    let dirs = tempdir().unwrap();
    let sink = DirectorySink::new(dirs.path().join("downloads"))
        .with_view_dir(dirs.path().join("view"))
        .with_viewer("true");

    // WHEN: Viewing
    let outcome = h
        .client
        .exporter()
        .unwrap()
        .export("invoices/9/pdf", &[], ExportMode::View, &sink)
        .await
        .unwrap();

    // THEN: The viewed copy outlives the call, nothing was saved
    let ExportOutcome::Viewed { path, filename, .. } = outcome else {
        panic!("expected a viewed outcome");
    };
    assert_eq!(filename, "invoice-9.pdf");
    assert_eq!(path, dirs.path().join("view").join("invoice-9.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
    assert!(!dirs.path().join("downloads").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn given_failing_viewer_when_viewed_then_error_and_copy_removed() {
    let server = pdf_server().await;
    let h = harness(api_base(&server), Some(USER_TOKEN));
    let dirs = tempdir().unwrap();
    let view_dir = dirs.path().join("view");
    let sink = DirectorySink::new(dirs.path())
        .with_view_dir(&view_dir)
        .with_viewer("false");

    let err = h
        .client
        .exporter()
        .unwrap()
        .export("invoices/9/pdf", &[], ExportMode::View, &sink)
        .await
        .unwrap_err();

    assert!(err.user_message().contains("viewer exited"), "{}", err.user_message());
    assert!(!view_dir.join("invoice-9.pdf").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn given_stale_view_copy_when_next_viewed_then_stale_copy_removed() {
    // GIVEN: A copy older than the retention window and a recent one
    let server = pdf_server().await;
    let h = harness(api_base(&server), Some(USER_TOKEN));
    let dirs = tempdir().unwrap();
    let view_dir = dirs.path().join("view");
    std::fs::create_dir_all(&view_dir).unwrap();
    let stale = view_dir.join("old.pdf");
    let recent = view_dir.join("recent.pdf");
    std::fs::write(&stale, b"old").unwrap();
    std::fs::write(&recent, b"recent").unwrap();
    std::fs::File::options()
        .write(true)
        .open(&stale)
        .unwrap()
        .set_modified(SystemTime::now() - VIEW_RETENTION - Duration::from_secs(60))
        .unwrap();
    let sink = DirectorySink::new(dirs.path())
        .with_view_dir(&view_dir)
        .with_viewer("true");

    // WHEN: Viewing another file
    h.client
        .exporter()
        .unwrap()
        .export("invoices/9/pdf", &[], ExportMode::View, &sink)
        .await
        .unwrap();

    // THEN
    assert!(!stale.exists());
    assert!(recent.exists());
    assert!(view_dir.join("invoice-9.pdf").exists());
}

/// **VALUE**: A viewer that blocks until closed does not stall the runtime.
///
/// **WHY THIS MATTERS**: `open -W` and `start /WAIT` wait for the viewer window to close.
/// Waiting on a runtime thread would freeze debouncers and other requests meanwhile.
///
/// **BUG THIS CATCHES**: Would catch the viewer being awaited through a blocking
/// process call.
#[cfg(unix)]
#[tokio::test(flavor = "current_thread")]
async fn given_slow_viewer_when_viewed_then_other_tasks_keep_running() {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // GIVEN: A viewer that takes half a second, and a task ticking every 20ms
    let server = pdf_server().await;
    let h = harness(api_base(&server), Some(USER_TOKEN));
    let dirs = tempdir().unwrap();
    let viewer = dirs.path().join("slow-viewer.sh");
    std::fs::write(&viewer, "#!/bin/sh\nsleep 0.5\n").unwrap();
    std::fs::set_permissions(&viewer, std::fs::Permissions::from_mode(0o755)).unwrap();
    let sink = DirectorySink::new(dirs.path())
        .with_view_dir(dirs.path().join("view"))
        .with_viewer(viewer.to_string_lossy());

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    // WHEN: Viewing on a single-threaded runtime
    h.client
        .exporter()
        .unwrap()
        .export("invoices/9/pdf", &[], ExportMode::View, &sink)
        .await
        .unwrap();
    ticker.abort();

    // THEN: The ticker ran while the viewer was open
    assert!(ticks.load(Ordering::SeqCst) >= 5, "runtime was blocked by the viewer");
}
