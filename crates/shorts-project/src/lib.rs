//! Persistent store for the working project document.
//!
//! The editor works against one project at a time: an analysis result and
//! a list of imported assets, persisted as a single JSON document next to
//! the service. This crate owns that document. Construction is explicit,
//! mutation goes through a request-response API, and interested tasks can
//! subscribe to change notifications, so nothing shares ambient global
//! state.

pub mod error;
pub mod prefs;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use prefs::{PreferenceStore, Preferences, PREFERENCES_FILE_NAME};
pub use store::{ProjectStore, RestoreResult, PROJECT_FILE_NAME};
