//! Security utilities for input validation.
//!
//! The media proxies fetch caller-supplied URLs, so every URL is checked
//! against scheme rules and a blocklist of internal and metadata endpoints
//! before any request leaves the server.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::Url;

/// Maximum URL length accepted by the proxies.
const MAX_URL_LENGTH: usize = 2048;

/// Maximum object key length accepted by bucket routes.
const MAX_KEY_LENGTH: usize = 1024;

/// Blocked URL patterns (internal ranges and metadata endpoints).
static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Block internal IP ranges
        Regex::new(r"^https?://127\.").unwrap(),
        Regex::new(r"^https?://localhost").unwrap(),
        Regex::new(r"^https?://10\.").unwrap(),
        Regex::new(r"^https?://172\.(1[6-9]|2[0-9]|3[0-1])\.").unwrap(),
        Regex::new(r"^https?://192\.168\.").unwrap(),
        Regex::new(r"^https?://169\.254\.").unwrap(),
        Regex::new(r"^https?://\[::1\]").unwrap(),
        Regex::new(r"^https?://\[fd").unwrap(),
        Regex::new(r"^https?://\[fe80").unwrap(),
        // Block cloud metadata endpoints
        Regex::new(r"^https?://metadata\.").unwrap(),
        Regex::new(r"^https?://169\.254\.169\.254").unwrap(),
        Regex::new(r"^https?://metadata\.google\.internal").unwrap(),
    ]
});

/// Result of URL validation.
#[derive(Debug)]
pub enum UrlValidationResult {
    /// URL is valid and allowed.
    Valid(String),
    /// URL is malformed or uses an unsupported protocol.
    Invalid(String),
    /// URL matches a blocked pattern (e.g., internal IPs).
    Blocked(String),
    /// URL exceeds maximum length.
    TooLong,
}

impl UrlValidationResult {
    /// Convert to Result for easy error handling.
    pub fn into_result(self) -> Result<String, String> {
        match self {
            Self::Valid(url) => Ok(url),
            Self::Invalid(msg) => Err(msg),
            Self::Blocked(reason) => Err(reason),
            Self::TooLong => Err(format!(
                "URL exceeds maximum length of {} characters",
                MAX_URL_LENGTH
            )),
        }
    }
}

/// Validate a URL before the server fetches it on a caller's behalf.
///
/// This function performs:
/// - Length validation
/// - Protocol validation (only http/https)
/// - Blocked pattern check (internal IPs, metadata endpoints)
pub fn validate_proxy_url(url: &str) -> UrlValidationResult {
    // Check length
    if url.len() > MAX_URL_LENGTH {
        return UrlValidationResult::TooLong;
    }

    // Trim and normalize
    let url = url.trim();
    if url.is_empty() {
        return UrlValidationResult::Invalid("URL cannot be empty".to_string());
    }

    // Parse URL
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => return UrlValidationResult::Invalid(format!("Invalid URL format: {}", e)),
    };

    // Check protocol
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return UrlValidationResult::Invalid(format!(
                "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
                scheme
            ))
        }
    }

    // Check for blocked patterns (internal IPs, metadata endpoints)
    for pattern in BLOCKED_PATTERNS.iter() {
        if pattern.is_match(url) {
            warn!(url = %url, "Blocked URL pattern detected");
            return UrlValidationResult::Blocked(
                "URL appears to target an internal or restricted endpoint".to_string(),
            );
        }
    }

    if parsed.host_str().is_none() {
        return UrlValidationResult::Invalid("URL must have a valid domain".to_string());
    }

    UrlValidationResult::Valid(url.to_string())
}

/// Validate an object key format. No path traversal, no absolute paths.
pub fn is_safe_object_key(key: &str) -> bool {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return false;
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return false;
    }
    true
}
