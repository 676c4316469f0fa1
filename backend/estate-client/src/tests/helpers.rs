//! Shared fixtures for unit tests.

use crate::session::{Navigator, Session};
use crate::storage::MemoryStorage;

use std::sync::{Arc, Mutex, Once};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Token whose payload is `{"role":"ROLE_USER"}`.
pub const USER_TOKEN: &str = "abc.eyJyb2xlIjoiUk9MRV9VU0VSIn0.sig";

/// Token whose payload is `{"sub":"admin","role":"ROLE_ADMIN"}`.
pub const ADMIN_TOKEN: &str = "abc.eyJzdWIiOiJhZG1pbiIsInJvbGUiOiJST0xFX0FETUlOIn0.sig";

pub fn memory_session() -> Session {
    Session::new(Arc::new(MemoryStorage::new()))
}

/// Navigator that remembers every redirect.
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

static CAPTURED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());
static INSTALL_LOGGER_ONCE: Once = Once::new();

struct CapturingLogger;

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

/// Install a logger that keeps every record in memory. Safe to call from every test.
pub fn capture_logs() {
    INSTALL_LOGGER_ONCE.call_once(|| {
        log::set_logger(&CapturingLogger).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// True if some record at `level` contains `needle`.
pub fn logged(level: Level, needle: &str) -> bool {
    CAPTURED
        .lock()
        .unwrap()
        .iter()
        .any(|(record_level, message)| *record_level == level && message.contains(needle))
}
