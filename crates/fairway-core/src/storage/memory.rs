//! Process-local session storage.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::session::SessionState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps serialized sessions in memory for the lifetime of the process.
///
/// States go through the same JSON encoding as on disk, so a session that
/// survives here also survives a [`FileStorage`](super::FileStorage).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> StorageResult<T> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&mut entries))
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, state: &SessionState) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let encoded = state.to_json();
        Box::pin(async move {
            let json = encoded?;
            self.with_entries(|entries| entries.insert(key, json))?;
            self.writes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<SessionState>> {
        let key = key.to_string();
        Box::pin(async move {
            let json = self
                .with_entries(|entries| entries.get(&key).cloned())?
                .ok_or(StorageError::NotFound(key))?;
            Ok(SessionState::from_json(&json)?)
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.with_entries(|entries| entries.remove(&key))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::TemplateMode;
    use pollster::block_on;

    #[test]
    fn test_save_then_load() {
        let storage = MemoryStorage::new();
        let state = SessionState {
            image_url: "uploads/ball.png".to_string(),
            template_type: TemplateMode::Custom,
            ..SessionState::default()
        };

        block_on(storage.save("visitor", &state)).unwrap();

        assert_eq!(block_on(storage.load("visitor")).unwrap(), state);
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nobody"));
        assert!(matches!(result, Err(StorageError::NotFound(key)) if key == "nobody"));
    }

    #[test]
    fn test_delete_forgets_and_tolerates_missing() {
        let storage = MemoryStorage::new();
        block_on(storage.save("visitor", &SessionState::default())).unwrap();

        block_on(storage.delete("visitor")).unwrap();
        block_on(storage.delete("visitor")).unwrap();

        assert!(matches!(block_on(storage.load("visitor")), Err(StorageError::NotFound(_))));
    }
}
