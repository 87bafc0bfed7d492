//! Waveform peak extraction.
//!
//! Fetches remote audio, decodes it to mono PCM through FFmpeg, and reduces
//! it to a fixed-length peak envelope for timeline rendering. Extraction is
//! non-critical: any failure yields a silent envelope of the requested
//! length, with the cause carried alongside for callers that want it.

use std::sync::OnceLock;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::command::create_ffmpeg_command;
use crate::error::{MediaError, MediaResult};

/// Default number of peaks per envelope.
pub const DEFAULT_SAMPLE_COUNT: usize = 100;

/// Decode sample rate. Envelopes don't need full fidelity.
const DECODE_SAMPLE_RATE: u32 = 16_000;

/// Hard ceiling on simultaneous decode processes.
const MAX_CONCURRENT_DECODES: usize = 6;

/// Timeout for fetching the remote audio bytes.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// One pool for the whole process, created on first use.
static DECODE_SLOTS: OnceLock<Semaphore> = OnceLock::new();

fn decode_slots() -> &'static Semaphore {
    DECODE_SLOTS.get_or_init(|| Semaphore::new(MAX_CONCURRENT_DECODES))
}

/// A peak envelope, possibly degraded.
///
/// `peaks` always holds exactly the requested number of values in `[0, 1]`.
/// When extraction failed at any stage, `failure` carries the cause and the
/// envelope is all zeros.
#[derive(Debug)]
pub struct PeakEnvelope {
    pub peaks: Vec<f32>,
    pub failure: Option<MediaError>,
}

impl PeakEnvelope {
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// Extracts peak envelopes from remote audio URLs.
#[derive(Clone)]
pub struct PeakExtractor {
    http: reqwest::Client,
}

impl Default for PeakExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakExtractor {
    /// Create an extractor with its own HTTP client.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// Create an extractor sharing an existing HTTP client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Extract a peak envelope of `sample_count` values from the audio at
    /// `url`. Never fails: see [`PeakEnvelope`].
    pub async fn extract_peaks(&self, url: &str, sample_count: usize) -> PeakEnvelope {
        match self.try_extract(url, sample_count).await {
            Ok(peaks) => PeakEnvelope {
                peaks,
                failure: None,
            },
            Err(e) => {
                warn!("Peak extraction failed for {}: {}", url, e);
                PeakEnvelope {
                    peaks: vec![0.0; sample_count],
                    failure: Some(e),
                }
            }
        }
    }

    async fn try_extract(&self, url: &str, sample_count: usize) -> MediaResult<Vec<f32>> {
        let permit = decode_slots()
            .acquire()
            .await
            .map_err(|_| MediaError::decode_failed("decode pool closed"))?;

        let bytes = self.fetch_audio(url).await?;
        let samples = decode_pcm_mono(&bytes).await?;
        drop(permit);

        if samples.is_empty() {
            return Err(MediaError::NoAudioData);
        }

        debug!(
            url = url,
            samples = samples.len(),
            "Decoded audio for peak extraction"
        );

        Ok(compute_peaks(&samples, sample_count))
    }

    async fn fetch_audio(&self, url: &str) -> MediaResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::fetch_failed(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| MediaError::fetch_failed(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::fetch_failed(e.to_string()))?;

        if bytes.is_empty() {
            return Err(MediaError::NoAudioData);
        }

        Ok(bytes.to_vec())
    }
}

/// Decode arbitrary audio bytes to mono f32 PCM via FFmpeg.
async fn decode_pcm_mono(bytes: &[u8]) -> MediaResult<Vec<f32>> {
    let input = NamedTempFile::new()?;
    let output = NamedTempFile::new()?;

    tokio::fs::write(input.path(), bytes).await?;

    let status = create_ffmpeg_command()?
        .args([
            "-i",
            input.path().to_str().unwrap_or_default(),
            "-vn", // No video
            "-ar",
            &DECODE_SAMPLE_RATE.to_string(),
            "-ac",
            "1", // Mono
            "-f",
            "f32le", // Raw 32-bit float little-endian
            "-y",    // Overwrite
            output.path().to_str().unwrap_or_default(),
        ])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map_err(|e| MediaError::decode_failed(e.to_string()))?;

    if !status.success() {
        return Err(MediaError::decode_failed(format!(
            "FFmpeg exited with code: {:?}",
            status.code()
        )));
    }

    let raw = tokio::fs::read(output.path()).await?;

    // 4 bytes per sample, little-endian
    let samples: Vec<f32> = raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(samples)
}

/// Reduce PCM samples to a block-RMS envelope of exactly `sample_count`
/// values in `[0, 1]`.
///
/// Samples are partitioned into `len / sample_count` blocks (a partial tail
/// block is discarded), each block contributes its RMS, the envelope is
/// normalized by its maximum, and square-root compression lifts quiet
/// passages. Deterministic for identical input.
pub fn compute_peaks(samples: &[f32], sample_count: usize) -> Vec<f32> {
    if sample_count == 0 {
        return Vec::new();
    }

    let block = samples.len() / sample_count;
    if block == 0 {
        return vec![0.0; sample_count];
    }

    let mut peaks = Vec::with_capacity(sample_count);
    for i in 0..sample_count {
        let start = i * block;
        let sum: f64 = samples[start..start + block]
            .iter()
            .map(|&s| (s as f64) * (s as f64))
            .sum();
        peaks.push((sum / block as f64).sqrt() as f32);
    }

    let max = peaks.iter().cloned().fold(0.0f32, f32::max);
    if max > 0.0 {
        for p in peaks.iter_mut() {
            *p = (*p / max).sqrt();
        }
    }

    peaks
}
