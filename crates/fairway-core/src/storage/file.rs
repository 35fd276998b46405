//! One JSON file per session key on the local disk.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::session::SessionState;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each session as `<key>.json` inside a directory.
///
/// Writes go to a sibling temp file that is renamed into place, so an
/// interrupted save leaves the previous state readable.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FileStorage {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        Ok(Self { dir })
    }

    /// The per-user data directory, e.g. `~/.local/share/fairway-ink/sessions`.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or(StorageError::NoDataDir)?;
        Self::new(base.join("fairway-ink").join("sessions"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys may come from URLs; anything outside `[A-Za-z0-9_-]` maps to `_`.
    fn file_for(&self, key: &str) -> PathBuf {
        let stem: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{stem}.json"))
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, state: &SessionState) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.file_for(key);
        let encoded = state.to_json();
        Box::pin(async move {
            let json = encoded?;
            let staging = path.with_extension("json.tmp");
            fs::write(&staging, json).map_err(io_error(&staging))?;
            fs::rename(&staging, &path).map_err(io_error(&path))?;
            log::debug!("saved session to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<SessionState>> {
        let path = self.file_for(key);
        let key = key.to_string();
        Box::pin(async move {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(StorageError::NotFound(key));
                }
                Err(e) => return Err(io_error(&path)(e)),
            };
            Ok(SessionState::from_json(&json)?)
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.file_for(key);
        Box::pin(async move {
            match fs::remove_file(&path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(&path)(e)),
                _ => Ok(()),
            }
        })
    }
}
