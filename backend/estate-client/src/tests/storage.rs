use crate::error::StorageError;
use crate::session::Session;
use crate::storage::{FileStorage, Storage, TOKEN_KEY};

use std::sync::Arc;

use tempfile::tempdir;

#[test]
fn given_file_storage_when_reopened_then_items_persist() {
    // GIVEN: A storage file with a token
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");
    let storage = FileStorage::open(&path).unwrap();
    storage.set_item(TOKEN_KEY, "persisted-token").unwrap();

    // WHEN: Reopening
    let reopened = FileStorage::open(&path).unwrap();

    // THEN: The token is still there and no temp file is left behind
    assert_eq!(
        reopened.get_item(TOKEN_KEY).unwrap().as_deref(),
        Some("persisted-token")
    );
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn given_file_storage_when_item_removed_then_gone_after_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let session = Session::new(Arc::new(FileStorage::open(&path).unwrap()));
    session.sign_in("abc").unwrap();

    session.sign_out().unwrap();

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get_item(TOKEN_KEY).unwrap(), None);
}

#[test]
fn given_missing_key_when_removed_then_ok() {
    let dir = tempdir().unwrap();
    let storage = FileStorage::open(dir.path().join("session.json")).unwrap();

    assert!(storage.remove_item("never-set").is_ok());
    assert!(!storage.path().exists(), "No write needed for a no-op removal");
}

#[test]
fn given_corrupt_file_when_opened_then_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();

    let result = FileStorage::open(&path);

    assert!(matches!(result, Err(StorageError::ParseError { .. })));
}

/// **VALUE**: Memory never runs ahead of disk.
///
/// **WHY THIS MATTERS**: A token that only lives in memory looks like a working login
/// until the next start, when the user is suddenly signed out.
///
/// **BUG THIS CATCHES**: Would catch the map being updated before the write succeeds.
#[test]
fn given_unwritable_file_when_item_set_then_error_and_memory_unchanged() {
    // GIVEN: A storage path whose parent is a regular file
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let storage = FileStorage::open(blocker.join("session.json")).unwrap();
    let session = Session::new(Arc::new(storage));

    // WHEN: Signing in
    let result = session.sign_in("never-persisted");

    // THEN: The write error surfaces and no token is visible
    assert!(matches!(result, Err(StorageError::WriteError { .. })));
    assert!(session.token().is_none());
}
