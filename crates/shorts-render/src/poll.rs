//! Output polling.
//!
//! The render backends have no channel to push completion back, so the only
//! completion signal is probing the expected output location until the
//! object becomes fetchable. The loop here is bounded: a fixed interval
//! between probes and a maximum attempt count, after which the job is
//! declared timed out.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::job::RenderJob;

/// Result of a single output probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Output object is fetchable.
    Ready,
    /// Output not present yet.
    Pending,
    /// Transport failure reaching the output location.
    Error(String),
}

/// Polling policy: fixed interval, bounded attempts.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between probes.
    pub interval: Duration,
    /// Maximum number of probes before declaring a timeout.
    pub max_attempts: u32,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
            operation_name: "render".to_string(),
        }
    }
}

impl PollConfig {
    /// Create a new poll config with the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    /// Set the probe interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the maximum number of probes.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Drive a job to a terminal state by probing its output location.
///
/// Stops at the first `ready` or `error` probe; no further probe is issued
/// after a terminal result. When `max_attempts` probes all come back
/// `pending`, the job is declared timed out. Timing goes through the tokio
/// clock, so a paused test runtime exercises the loop without real delays.
pub async fn poll_to_completion<F, Fut>(config: &PollConfig, job: RenderJob, probe: F) -> RenderJob
where
    F: Fn() -> Fut,
    Fut: Future<Output = PollStatus>,
{
    let mut job = job.begin_polling();

    for attempt in 1..=config.max_attempts {
        job = job.record_attempt();

        match probe().await {
            PollStatus::Ready => {
                debug!(
                    "{} output ready after {} polls",
                    config.operation_name, attempt
                );
                return job.complete();
            }
            PollStatus::Error(message) => {
                debug!("{} poll failed: {}", config.operation_name, message);
                return job.fail(message);
            }
            PollStatus::Pending if attempt < config.max_attempts => {
                tokio::time::sleep(config.interval).await;
            }
            PollStatus::Pending => {}
        }
    }

    job.time_out()
}
