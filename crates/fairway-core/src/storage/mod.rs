//! Persistence backends for the design session.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::session::SessionState;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No stored session under {0:?}")]
    NotFound(String),
    #[error("Malformed session data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not determine a data directory")]
    NoDataDir,
    #[error("Session store lock was poisoned")]
    Poisoned,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A place to keep session state between runs.
///
/// Missing keys load as [`StorageError::NotFound`]; deleting a missing key
/// succeeds.
pub trait Storage: Send + Sync {
    fn save(&self, key: &str, state: &SessionState) -> BoxFuture<'_, StorageResult<()>>;

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<SessionState>>;

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;
}
