//! Downloaded bytes and the scoped handle used to hand them to a sink.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tempfile::{Builder, NamedTempFile};
use tokio::fs;
use tokio::process::Command;

/// Used when the server does not declare a content type.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Viewed copies older than this are removed when the next file is viewed.
pub const VIEW_RETENTION: Duration = Duration::from_secs(60 * 60);

const VIEW_DIR_NAME: &str = "estate-view";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        let content_type = content_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        Self {
            bytes,
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A blob materialised as a temporary file for the duration of one export.
///
/// The file is removed when the handle drops, so nothing outlives the call that
/// created it.
pub struct ObjectUrl {
    file: NamedTempFile,
    content_type: String,
}

impl ObjectUrl {
    /// `filename` only contributes its extension, so viewers pick the right program.
    pub fn create(blob: &Blob, filename: &str) -> Result<Self, std::io::Error> {
        let suffix = Path::new(filename)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| format!(".{extension}"))
            .unwrap_or_default();

        let mut file = Builder::new().prefix("estate-export-").suffix(&suffix).tempfile()?;
        file.write_all(&blob.bytes)?;
        file.flush()?;

        debug!("Created object {} ({} bytes)", file.path().display(), blob.len());
        Ok(Self {
            file,
            content_type: blob.content_type.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        debug!("Releasing object {}", self.file.path().display());
    }
}

/// Where an exported file ends up: saved under a name, or opened for viewing.
#[async_trait]
pub trait BlobSink: Send + Sync {
    /// Save-as. Returns the final location.
    async fn save(&self, object: &ObjectUrl, filename: &str) -> Result<PathBuf, std::io::Error>;

    /// Hand the file to a viewer. Returns the path the viewer was given, which must
    /// stay readable after `object` is released.
    async fn open(&self, object: &ObjectUrl, filename: &str) -> Result<PathBuf, std::io::Error>;
}

/// Saves into a directory and opens with the platform's default program.
///
/// Viewed files are copied into a view directory first because some openers
/// (`xdg-open`) return before the viewer has read the file. Copies older than
/// [`VIEW_RETENTION`] are removed on the next view.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    view_dir: PathBuf,
    viewer: Option<String>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            view_dir: std::env::temp_dir().join(VIEW_DIR_NAME),
            viewer: None,
        }
    }

    pub fn with_view_dir(mut self, view_dir: impl Into<PathBuf>) -> Self {
        self.view_dir = view_dir.into();
        self
    }

    /// Run `program <file>` instead of the platform opener.
    pub fn with_viewer(mut self, program: impl Into<String>) -> Self {
        self.viewer = Some(program.into());
        self
    }
}

#[async_trait]
impl BlobSink for DirectorySink {
    async fn save(&self, object: &ObjectUrl, filename: &str) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(&self.dir).await?;
        let target = unique_path(&self.dir, filename).await?;
        fs::copy(object.path(), &target).await?;
        info!("Saved {} to {}", object.content_type(), target.display());
        Ok(target)
    }

    async fn open(&self, object: &ObjectUrl, filename: &str) -> Result<PathBuf, std::io::Error> {
        prune_view_dir(&self.view_dir).await;
        fs::create_dir_all(&self.view_dir).await?;
        let target = unique_path(&self.view_dir, filename).await?;
        fs::copy(object.path(), &target).await?;

        let outcome = match viewer_command(self.viewer.as_deref(), &target).status().await {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(std::io::Error::other(format!("viewer exited with {status}"))),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            if let Err(remove_error) = fs::remove_file(&target).await {
                warn!("Failed to remove {}: {remove_error}", target.display());
            }
            return Err(e);
        }

        info!("Opened {} in viewer", object.content_type());
        Ok(target)
    }
}

/// `name.xlsx`, then `name (1).xlsx`, `name (2).xlsx`, ... like a browser.
async fn unique_path(dir: &Path, filename: &str) -> Result<PathBuf, std::io::Error> {
    let candidate = dir.join(filename);
    if !fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }

    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename);
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{extension}"))
        .unwrap_or_default();

    let mut n: u32 = 1;
    loop {
        let candidate = dir.join(format!("{stem} ({n}){extension}"));
        if !fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

async fn prune_view_dir(view_dir: &Path) {
    let Ok(mut entries) = fs::read_dir(view_dir).await else {
        return;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let stale = entry
            .metadata()
            .await
            .ok()
            .and_then(|metadata| metadata.modified().ok())
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age > VIEW_RETENTION);
        if !stale {
            continue;
        }
        match fs::remove_file(entry.path()).await {
            Ok(()) => debug!("Removed stale view copy {}", entry.path().display()),
            Err(e) => warn!("Failed to remove {}: {e}", entry.path().display()),
        }
    }
}

fn viewer_command(viewer: Option<&str>, path: &Path) -> Command {
    match viewer {
        Some(program) => {
            let mut command = Command::new(program);
            command.arg(path);
            command
        }
        None => opener_command(path),
    }
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg("-W").arg(path);
    command
}

#[cfg(target_os = "windows")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "/WAIT", ""]).arg(path);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}
