//! FFmpeg-backed audio plumbing.
//!
//! This crate provides:
//! - FFmpeg subprocess invocation for decoding arbitrary audio to mono PCM
//! - Waveform peak-envelope extraction with a bounded decode pool
//! - Minimal WAV container assembly for synthesized voiceovers

pub mod command;
pub mod error;
pub mod peaks;
pub mod wav;

pub use command::{check_ffmpeg, create_ffmpeg_command};
pub use error::{MediaError, MediaResult};
pub use peaks::{compute_peaks, PeakEnvelope, PeakExtractor, DEFAULT_SAMPLE_COUNT};
pub use wav::{looks_like_mp3, parse_rate_from_mime, wrap_pcm_in_wav};
