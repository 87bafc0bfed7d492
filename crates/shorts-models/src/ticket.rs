//! Upload ticket issued by the storage gateway.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Presigned grant for uploading one object and reading it back.
///
/// `upload_url` is a short-lived write URL (about an hour); `public_url` is
/// a long-lived read URL (about a week) for immediate playback. Field names
/// are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    /// Final object key under the destination prefix
    pub key: String,

    /// Presigned PUT URL
    pub upload_url: String,

    /// Presigned GET URL
    pub public_url: String,
}
