pub mod api;
pub mod config;
pub mod storage;

pub use api::{ApiError, ErrorKind};
pub use config::ConfigError;
pub use storage::StorageError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
