//! Client for the delegated render and subtitle backends.
//!
//! Rendering runs in an external, independently scaled service with no
//! push channel back to this system. This crate submits work to it and
//! detects completion by polling the expected output location: submission
//! acknowledgments come back immediately, and a bounded poll loop drives a
//! [`RenderJob`] to a terminal state.

pub mod client;
pub mod error;
pub mod job;
pub mod poll;

pub use client::{
    derive_output_key, BackendCredentials, OutputProbe, ProcessSubmission, RenderClient,
    RenderConfig,
};
pub use error::{RenderError, RenderResult};
pub use job::{RenderJob, RenderJobId, RenderJobState};
pub use poll::{poll_to_completion, PollConfig, PollStatus};
