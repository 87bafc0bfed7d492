//! Render history handler.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::ApiResult;
use crate::state::AppState;

/// How far back the history listing reaches.
const HISTORY_WINDOW_HOURS: i64 = 48;

/// List recent render results, newest first.
///
/// Each item is the parsed result document with the object key and
/// timestamp folded in. Unreadable documents are skipped rather than
/// failing the whole listing.
pub async fn history(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    let storage = state.storage()?;

    let cutoff_ms = (Utc::now().timestamp_millis() - HISTORY_WINDOW_HOURS * 3_600_000) as u64;

    let mut results: Vec<_> = storage
        .list_objects("processed/")
        .await?
        .into_iter()
        .filter(|obj| obj.key.ends_with("_result.json"))
        .filter(|obj| obj.last_modified.is_some_and(|ms| ms > cutoff_ms))
        .collect();

    // Newest first
    results.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

    let mut items = Vec::with_capacity(results.len());
    for obj in results {
        let bytes = match storage.download_bytes(&obj.key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to fetch history item {}: {}", obj.key, e);
                continue;
            }
        };

        let data: Map<String, Value> = match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(e) => {
                warn!("Unreadable history item {}: {}", obj.key, e);
                continue;
            }
        };

        let mut item = Map::new();
        item.insert("key".to_string(), json!(obj.key));
        if let Some(iso) = obj.last_modified.and_then(format_millis) {
            item.insert("lastModified".to_string(), json!(iso));
        }
        // Result fields win over ours on collision
        for (k, v) in data {
            item.insert(k, v);
        }

        items.push(Value::Object(item));
    }

    Ok(Json(items))
}

fn format_millis(ms: u64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millis_is_iso_utc() {
        let iso = format_millis(1_700_000_000_000).unwrap();
        assert!(iso.ends_with('Z'));
        assert!(iso.starts_with("2023-11-14T"));
    }
}
