//! User preference store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::StoreResult;

/// File name of the persisted preferences.
pub const PREFERENCES_FILE_NAME: &str = "shorts_alpha_preferences.json";

/// Persisted user preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Low-overhead UI mode: disables ambient animation and heavy
    /// previews for weaker machines.
    #[serde(default)]
    pub lite_mode: bool,
}

/// Store for small user preferences.
///
/// Same persistence shape as [`crate::store::ProjectStore`] but without
/// observers; preferences are read on demand.
pub struct PreferenceStore {
    path: PathBuf,
    state: Mutex<Preferences>,
}

impl PreferenceStore {
    /// Open a store backed by the given path. A missing or unreadable
    /// file starts from defaults.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(
                    "Resetting unreadable preferences {}: {}",
                    path.display(),
                    e
                );
                Preferences::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current preferences.
    pub async fn get(&self) -> Preferences {
        self.state.lock().await.clone()
    }

    /// Set lite mode and persist.
    pub async fn set_lite_mode(&self, enabled: bool) -> StoreResult<Preferences> {
        let mut state = self.state.lock().await;
        state.lite_mode = enabled;
        let json = serde_json::to_vec_pretty(&*state)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_to_lite_mode_off() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(dir.path().join(PREFERENCES_FILE_NAME))
            .await
            .unwrap();
        assert!(!store.get().await.lite_mode);
    }

    #[tokio::test]
    async fn test_lite_mode_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE_NAME);

        {
            let store = PreferenceStore::open(&path).await.unwrap();
            let prefs = store.set_lite_mode(true).await.unwrap();
            assert!(prefs.lite_mode);
        }

        let store = PreferenceStore::open(&path).await.unwrap();
        assert!(store.get().await.lite_mode);
    }

    #[tokio::test]
    async fn test_unreadable_file_resets_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE_NAME);
        tokio::fs::write(&path, b"garbage").await.unwrap();

        let store = PreferenceStore::open(&path).await.unwrap();
        assert_eq!(store.get().await, Preferences::default());
    }
}
