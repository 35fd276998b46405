//! Persisted design session state.
//!
//! Holds the per-visitor fields that survive a page reload (uploaded image,
//! generated model, template and editor mode). The state is initialised from
//! storage when a session opens and written back after every update.

use crate::storage::{Storage, StorageError, StorageResult};
use crate::tools::{EditorMode, TemplateMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage key used when the host does not pick one.
pub const DEFAULT_SESSION_KEY: &str = "design";

/// Model file shown before anything has been generated.
pub const DEFAULT_STL_URL: &str = "default.stl";

/// Snapshot of the design session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    /// Base image as a URL or data URL; empty when none is loaded.
    pub image_url: String,
    /// Location of the most recently generated model.
    pub stl_url: String,
    /// Generation counter used to bust model caches.
    pub stl_key: u64,
    pub template_type: TemplateMode,
    pub editor_mode: EditorMode,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            stl_url: DEFAULT_STL_URL.to_string(),
            stl_key: 0,
            template_type: TemplateMode::default(),
            editor_mode: EditorMode::default(),
        }
    }
}

impl SessionState {
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The active design session bound to a storage backend.
pub struct Session<S: Storage> {
    storage: Arc<S>,
    key: String,
    state: SessionState,
}

impl<S: Storage> Session<S> {
    /// Open the session stored under `key`, falling back to defaults when
    /// nothing has been persisted yet.
    pub async fn open(storage: Arc<S>, key: impl Into<String>) -> StorageResult<Self> {
        let key = key.into();
        let state = match storage.load(&key).await {
            Ok(state) => state,
            Err(StorageError::NotFound(_)) => {
                log::debug!("no stored session under {key:?}, starting fresh");
                SessionState::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self { storage, key, state })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn update_image_url(&mut self, url: impl Into<String>) -> StorageResult<()> {
        self.state.image_url = url.into();
        self.persist().await
    }

    pub async fn update_stl(&mut self, url: impl Into<String>) -> StorageResult<()> {
        self.state.stl_url = url.into();
        self.persist().await
    }

    /// Advance the generation counter.
    pub async fn bump_stl_key(&mut self) -> StorageResult<u64> {
        self.state.stl_key += 1;
        self.persist().await?;
        Ok(self.state.stl_key)
    }

    pub async fn update_template_type(&mut self, template: TemplateMode) -> StorageResult<()> {
        self.state.template_type = template;
        self.persist().await
    }

    pub async fn update_editor_mode(&mut self, mode: EditorMode) -> StorageResult<()> {
        self.state.editor_mode = mode;
        self.persist().await
    }

    /// Forget everything persisted for this session.
    pub async fn reset(&mut self) -> StorageResult<()> {
        self.storage.delete(&self.key).await?;
        self.state = SessionState::default();
        Ok(())
    }

    async fn persist(&self) -> StorageResult<()> {
        self.storage.save(&self.key, &self.state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use pollster::block_on;

    #[test]
    fn test_open_without_stored_state_uses_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        let session = block_on(Session::open(storage, DEFAULT_SESSION_KEY)).unwrap();

        assert_eq!(session.state(), &SessionState::default());
        assert_eq!(session.state().stl_url, DEFAULT_STL_URL);
        assert_eq!(session.state().template_type, TemplateMode::Solid);
        assert!(!session.state().has_image());
    }

    #[test]
    fn test_updates_are_written_back() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = block_on(Session::open(storage.clone(), "s1")).unwrap();

        block_on(session.update_image_url("data:image/png;base64,AA")).unwrap();
        block_on(session.update_template_type(TemplateMode::Custom)).unwrap();
        block_on(session.update_editor_mode(EditorMode::Type)).unwrap();
        assert_eq!(block_on(session.bump_stl_key()).unwrap(), 1);

        let reopened = block_on(Session::open(storage, "s1")).unwrap();
        assert_eq!(reopened.state(), session.state());
        assert_eq!(reopened.state().stl_key, 1);
        assert!(reopened.state().has_image());
    }

    #[test]
    fn test_reset_clears_persisted_state() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = block_on(Session::open(storage.clone(), "s1")).unwrap();
        block_on(session.update_stl("orders/ball.stl")).unwrap();

        block_on(session.reset()).unwrap();

        assert_eq!(session.state(), &SessionState::default());
        assert!(matches!(block_on(storage.load("s1")), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_every_update_is_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = block_on(Session::open(storage.clone(), "s1")).unwrap();
        assert_eq!(storage.writes(), 0);

        block_on(session.update_editor_mode(EditorMode::Select)).unwrap();
        block_on(session.update_stl("orders/ball.stl")).unwrap();
        block_on(session.bump_stl_key()).unwrap();

        assert_eq!(storage.writes(), 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let state = SessionState::from_json(r#"{"template_type":"text"}"#).unwrap();
        assert_eq!(state.template_type, TemplateMode::Text);
        assert_eq!(state.stl_url, DEFAULT_STL_URL);
    }
}
