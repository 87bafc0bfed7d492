//! Application state.

use std::sync::Arc;

use shorts_media::PeakExtractor;
use shorts_project::{PreferenceStore, ProjectStore, RestoreResult, PREFERENCES_FILE_NAME, PROJECT_FILE_NAME};
use shorts_render::RenderClient;
use shorts_storage::{StorageClient, TicketConfig};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state.
///
/// The storage client is optional: a deployment without R2 credentials still
/// serves generation, project and health endpoints, and storage-backed
/// routes report the missing configuration instead.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Option<Arc<StorageClient>>,
    pub tickets: TicketConfig,
    pub render: Arc<RenderClient>,
    pub peaks: Arc<PeakExtractor>,
    pub project: Arc<ProjectStore>,
    pub prefs: Arc<PreferenceStore>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = match StorageClient::from_env() {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!("Storage not configured, bucket routes disabled: {}", e);
                None
            }
        };

        tokio::fs::create_dir_all(&config.data_dir).await?;

        let (project, restore) = ProjectStore::open(config.data_dir.join(PROJECT_FILE_NAME)).await?;
        match restore {
            RestoreResult::Fresh => info!("Starting with a fresh project document"),
            RestoreResult::Loaded => info!("Restored project document"),
            RestoreResult::Discarded(ref reason) => {
                warn!("Discarded unreadable project document: {}", reason)
            }
        }

        let prefs = PreferenceStore::open(config.data_dir.join(PREFERENCES_FILE_NAME)).await?;

        let render = RenderClient::from_env()?;
        let http = reqwest::Client::new();

        Ok(Self {
            config,
            storage,
            tickets: TicketConfig::from_env(),
            render: Arc::new(render),
            peaks: Arc::new(PeakExtractor::with_client(http.clone())),
            project: Arc::new(project),
            prefs: Arc::new(prefs),
            http,
        })
    }

    /// Storage client, or a configuration error for routes that need it.
    pub fn storage(&self) -> ApiResult<&Arc<StorageClient>> {
        self.storage
            .as_ref()
            .ok_or_else(|| ApiError::config("Storage not configured"))
    }
}
