use common::ErrorLocation;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage Read Error: {path}: {source} {location}")]
    ReadError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage Parse Error: {path}: {reason} {location}")]
    ParseError {
        location: ErrorLocation,
        path: PathBuf,
        reason: String,
    },

    #[error("Storage Write Error: {path}: {source} {location}")]
    WriteError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage Lock Poisoned: {location}")]
    Poisoned { location: ErrorLocation },

    #[error("Storage Value Error: {key}: {reason} {location}")]
    ValueError {
        location: ErrorLocation,
        key: String,
        reason: String,
    },
}
