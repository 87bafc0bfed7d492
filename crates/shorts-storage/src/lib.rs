//! Cloudflare R2 storage gateway.
//!
//! One client object for everything the backend does against the bucket:
//! presigned upload tickets, best-effort batch deletion, ranged reads for
//! streaming playback, and paged listing for history and retention sweeps.

pub mod client;
pub mod error;
pub mod keys;
pub mod tickets;

pub use client::{ObjectInfo, RangedObject, StorageClient, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use keys::derive_object_key;
pub use tickets::TicketConfig;
