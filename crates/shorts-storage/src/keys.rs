//! Object key derivation and sanitization.

use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Longest human-readable name part kept in a key.
const MAX_NAME_LEN: usize = 64;

/// Longest extension kept in a key.
const MAX_EXT_LEN: usize = 8;

/// Random id length (hex chars of a v4 UUID).
const ID_LEN: usize = 12;

/// Reduce a human-readable name to key-safe characters.
///
/// Spaces become underscores; anything outside `[A-Za-z0-9-_]` is dropped.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_NAME_LEN)
        .collect()
}

/// Extract and sanitize the extension of an uploaded filename.
///
/// Falls back to `bin` when the filename has no usable extension.
pub fn sanitize_extension(filename: &str) -> String {
    let ext: String = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXT_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() {
        "bin".to_string()
    } else {
        ext
    }
}

/// Whether a destination prefix is acceptable (single key-safe segment).
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.len() <= 32
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Derive the object key for a new upload.
///
/// Shape: `{prefix}/{id}.{ext}` or `{prefix}/{id}-{name}.{ext}` when a
/// usable custom name is given.
pub fn derive_object_key(
    prefix: &str,
    filename: &str,
    custom_name: Option<&str>,
) -> StorageResult<String> {
    if !is_valid_prefix(prefix) {
        return Err(StorageError::invalid_key(format!(
            "invalid destination prefix: {prefix:?}"
        )));
    }

    let ext = sanitize_extension(filename);
    let id = Uuid::new_v4().simple().to_string();
    let id = &id[..ID_LEN];

    let name = custom_name.map(sanitize_name).unwrap_or_default();
    let key = if name.is_empty() {
        format!("{prefix}/{id}.{ext}")
    } else {
        format!("{prefix}/{id}-{name}.{ext}")
    };

    Ok(key)
}
