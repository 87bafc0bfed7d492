//! FFmpeg subprocess invocation.

use std::path::PathBuf;

use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Create a [`Command`] for the resolved FFmpeg binary.
///
/// Stdio and arguments are left to the caller.
pub fn create_ffmpeg_command() -> MediaResult<Command> {
    Ok(Command::new(check_ffmpeg()?))
}
