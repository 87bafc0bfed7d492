//! Project document models.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::script::AnalysisResult;

/// An asset the user has imported into the project.
///
/// Only `key` and `content_type` matter to the backend; editors attach
/// arbitrary extra fields (display name, duration, thumbnails) which are
/// preserved verbatim through load/merge/persist cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImportedAsset {
    /// Object key in storage
    pub key: String,

    /// MIME type of the asset
    pub content_type: String,

    /// Editor-owned fields, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The whole project document.
///
/// Always fully populated after load: a missing field deserializes to its
/// default rather than staying absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectData {
    /// Latest script-generation result, if any
    #[serde(default)]
    pub analysis_result: Option<AnalysisResult>,

    /// Imported assets in insertion order
    #[serde(default)]
    pub imported_assets: Vec<ImportedAsset>,
}

impl ProjectData {
    /// Shallow-merge a patch into this document.
    ///
    /// A field absent from the patch is left untouched; an explicit null
    /// clears it. Patch contents are not validated.
    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(analysis_result) = patch.analysis_result {
            self.analysis_result = analysis_result;
        }
        if let Some(imported_assets) = patch.imported_assets {
            self.imported_assets = imported_assets;
        }
    }
}

/// Shallow patch for [`ProjectData`].
///
/// The double `Option` on `analysis_result` distinguishes "leave as is"
/// (absent) from "set to null" (explicit null).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, deserialize_with = "present")]
    pub analysis_result: Option<Option<AnalysisResult>>,

    #[serde(default)]
    pub imported_assets: Option<Vec<ImportedAsset>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.analysis_result.is_none() && self.imported_assets.is_none()
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
