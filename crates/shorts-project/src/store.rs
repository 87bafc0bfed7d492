//! Project document store.
//!
//! One working project per store: a single JSON document holding the
//! latest analysis result and the imported asset list. All mutation goes
//! through the store, which merges a patch into the current document,
//! persists the whole document, and notifies subscribers. Nothing else
//! writes the backing file.

use std::path::{Path, PathBuf};

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use shorts_models::{ImportedAsset, ProjectData, ProjectPatch};

use crate::error::StoreResult;

/// File name of the persisted project document.
pub const PROJECT_FILE_NAME: &str = "shorts_alpha_project.json";

/// How the persisted document was brought in at open time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreResult {
    /// No document on disk; starting from defaults.
    Fresh,
    /// Document loaded from disk.
    Loaded,
    /// A document existed but could not be parsed; starting from
    /// defaults. The unreadable file stays in place until the next
    /// write replaces it.
    Discarded(String),
}

/// Store for the working project document.
pub struct ProjectStore {
    path: PathBuf,
    state: Mutex<ProjectData>,
    changes: watch::Sender<ProjectData>,
}

impl ProjectStore {
    /// Open a store backed by the given document path.
    ///
    /// A missing file starts an empty project. An unparsable file also
    /// starts an empty project, with the failure reported through
    /// [`RestoreResult::Discarded`] instead of an error, so a corrupt
    /// document never takes the service down.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<(Self, RestoreResult)> {
        let path = path.into();

        let (data, restore) = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<ProjectData>(&bytes) {
                Ok(data) => (data, RestoreResult::Loaded),
                Err(e) => {
                    warn!(
                        "Discarding unreadable project document {}: {}",
                        path.display(),
                        e
                    );
                    (
                        ProjectData::default(),
                        RestoreResult::Discarded(e.to_string()),
                    )
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (ProjectData::default(), RestoreResult::Fresh)
            }
            Err(e) => return Err(e.into()),
        };

        let (changes, _) = watch::channel(data.clone());

        Ok((
            Self {
                path,
                state: Mutex::new(data),
                changes,
            },
            restore,
        ))
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current document.
    pub async fn get(&self) -> ProjectData {
        self.state.lock().await.clone()
    }

    /// Merge a patch into the document, persist it, and notify
    /// subscribers. Fields absent from the patch keep their values.
    pub async fn update(&self, patch: ProjectPatch) -> StoreResult<ProjectData> {
        let mut state = self.state.lock().await;
        state.apply(patch);
        self.persist(&state).await?;
        self.changes.send_replace(state.clone());
        Ok(state.clone())
    }

    /// Append one imported asset, keeping arrival order.
    pub async fn append_asset(&self, asset: ImportedAsset) -> StoreResult<ProjectData> {
        let mut state = self.state.lock().await;
        state.imported_assets.push(asset);
        self.persist(&state).await?;
        self.changes.send_replace(state.clone());
        Ok(state.clone())
    }

    /// Reset the document to defaults and remove the backing file.
    pub async fn clear(&self) -> StoreResult<ProjectData> {
        let mut state = self.state.lock().await;
        *state = ProjectData::default();

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.changes.send_replace(state.clone());
        info!("Cleared project document at {}", self.path.display());
        Ok(state.clone())
    }

    /// Subscribe to document changes. The receiver always holds the
    /// latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ProjectData> {
        self.changes.subscribe()
    }

    async fn persist(&self, data: &ProjectData) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_patch() -> ProjectPatch {
        serde_json::from_value(serde_json::json!({
            "analysis_result": {
                "virality_score": 78,
                "script": [{"time": "00:00-00:05", "text": "hi", "visual": "cat"}]
            }
        }))
        .unwrap()
    }

    fn asset(key: &str) -> ImportedAsset {
        ImportedAsset {
            key: key.to_string(),
            content_type: "video/mp4".to_string(),
            extra: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_open_missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let (store, restore) = ProjectStore::open(dir.path().join(PROJECT_FILE_NAME))
            .await
            .unwrap();

        assert_eq!(restore, RestoreResult::Fresh);
        let data = store.get().await;
        assert!(data.analysis_result.is_none());
        assert!(data.imported_assets.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE_NAME);

        let (store, _) = ProjectStore::open(&path).await.unwrap();
        store.update(sample_patch()).await.unwrap();

        // A patch touching only assets leaves the analysis in place.
        let assets_only: ProjectPatch = serde_json::from_value(serde_json::json!({
            "imported_assets": [{"key": "uploads/a.mp4", "content_type": "video/mp4"}]
        }))
        .unwrap();
        let merged = store.update(assets_only).await.unwrap();

        assert!(merged.analysis_result.is_some());
        assert_eq!(merged.imported_assets.len(), 1);
    }

    #[tokio::test]
    async fn test_document_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE_NAME);

        {
            let (store, _) = ProjectStore::open(&path).await.unwrap();
            store.update(sample_patch()).await.unwrap();
        }

        let (store, restore) = ProjectStore::open(&path).await.unwrap();
        assert_eq!(restore, RestoreResult::Loaded);
        let data = store.get().await;
        assert_eq!(data.analysis_result.unwrap().virality_score, 78.0);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_discarded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE_NAME);
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let (store, restore) = ProjectStore::open(&path).await.unwrap();
        assert!(matches!(restore, RestoreResult::Discarded(_)));
        assert!(store.get().await.analysis_result.is_none());

        // The next write replaces the unreadable file.
        store.update(sample_patch()).await.unwrap();
        let (_, restore) = ProjectStore::open(&path).await.unwrap();
        assert_eq!(restore, RestoreResult::Loaded);
    }

    #[tokio::test]
    async fn test_assets_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = ProjectStore::open(dir.path().join(PROJECT_FILE_NAME))
            .await
            .unwrap();

        store.append_asset(asset("uploads/1.mp4")).await.unwrap();
        store.append_asset(asset("uploads/2.mp4")).await.unwrap();
        let data = store.append_asset(asset("uploads/3.mp4")).await.unwrap();

        let keys: Vec<&str> = data.imported_assets.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["uploads/1.mp4", "uploads/2.mp4", "uploads/3.mp4"]);
    }

    #[tokio::test]
    async fn test_clear_resets_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE_NAME);

        let (store, _) = ProjectStore::open(&path).await.unwrap();
        store.update(sample_patch()).await.unwrap();
        assert!(path.exists());

        let cleared = store.clear().await.unwrap();
        assert!(cleared.analysis_result.is_none());
        assert!(!path.exists());

        // Clearing an already clean store is not an error.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_updates_serialize() {
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE_NAME);
        let (store, _) = ProjectStore::open(&path).await.unwrap();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            let patch: ProjectPatch = serde_json::from_value(serde_json::json!({
                "imported_assets": [
                    {"key": format!("uploads/{i}.mp4"), "content_type": "video/mp4"}
                ]
            }))
            .unwrap();
            handles.push(tokio::spawn(async move { store.update(patch).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Whichever writer ran last, the persisted document matches the
        // in-memory state exactly. Each patch replaces the asset list, so
        // a torn or interleaved write would show up here.
        let disk: ProjectData =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(disk, store.get().await);
        assert_eq!(disk.imported_assets.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = ProjectStore::open(dir.path().join(PROJECT_FILE_NAME))
            .await
            .unwrap();

        let mut rx = store.subscribe();
        store.update(sample_patch()).await.unwrap();

        rx.changed().await.unwrap();
        assert!(rx.borrow().analysis_result.is_some());
    }
}
