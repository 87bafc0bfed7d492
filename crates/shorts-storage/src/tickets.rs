//! Upload ticket issuing.

use std::time::Duration;

use shorts_models::UploadTicket;
use tracing::info;

use crate::client::StorageClient;
use crate::error::StorageResult;
use crate::keys;

/// Default write-grant lifetime: one hour.
pub const DEFAULT_UPLOAD_EXPIRY_SECS: u64 = 3_600;

/// Default read-grant lifetime: one week.
pub const DEFAULT_READ_EXPIRY_SECS: u64 = 604_800;

/// Hard cap accepted by S3-style presigning (one week).
pub const MAX_EXPIRY_SECS: u64 = 604_800;

/// Expiry policy for issued tickets.
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Lifetime of the presigned PUT URL
    pub upload_expiry: Duration,
    /// Lifetime of the presigned GET URL
    pub read_expiry: Duration,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            upload_expiry: Duration::from_secs(DEFAULT_UPLOAD_EXPIRY_SECS),
            read_expiry: Duration::from_secs(DEFAULT_READ_EXPIRY_SECS),
        }
    }
}

impl TicketConfig {
    /// Create config from environment variables, clamped to the service cap.
    pub fn from_env() -> Self {
        Self {
            upload_expiry: Duration::from_secs(parse_expiry(
                std::env::var("UPLOAD_URL_EXPIRY_SECS").ok().as_deref(),
                DEFAULT_UPLOAD_EXPIRY_SECS,
            )),
            read_expiry: Duration::from_secs(parse_expiry(
                std::env::var("READ_URL_EXPIRY_SECS").ok().as_deref(),
                DEFAULT_READ_EXPIRY_SECS,
            )),
        }
    }
}

fn parse_expiry(value: Option<&str>, default: u64) -> u64 {
    value
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
        .min(MAX_EXPIRY_SECS)
}

impl StorageClient {
    /// Issue an upload ticket: derive the key, presign a write URL and a
    /// read URL for immediate playback.
    pub async fn request_upload(
        &self,
        config: &TicketConfig,
        filename: &str,
        content_type: &str,
        prefix: &str,
        custom_name: Option<&str>,
    ) -> StorageResult<UploadTicket> {
        let key = keys::derive_object_key(prefix, filename, custom_name)?;

        let upload_url = self
            .presign_put(&key, content_type, config.upload_expiry)
            .await?;
        let public_url = self.presign_get(&key, config.read_expiry).await?;

        info!("Issued upload ticket for {}", key);

        Ok(UploadTicket {
            key,
            upload_url,
            public_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expiries() {
        let config = TicketConfig::default();
        assert_eq!(config.upload_expiry, Duration::from_secs(3_600));
        assert_eq!(config.read_expiry, Duration::from_secs(604_800));
    }

    #[test]
    fn test_parse_expiry_clamps_to_cap() {
        assert_eq!(parse_expiry(Some("900"), 3_600), 900);
        assert_eq!(parse_expiry(Some("9999999"), 3_600), MAX_EXPIRY_SECS);
        assert_eq!(parse_expiry(Some("not a number"), 3_600), 3_600);
        assert_eq!(parse_expiry(None, 3_600), 3_600);
    }
}
