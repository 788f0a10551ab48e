//! Local media processing backed by ffmpeg/ffprobe.

use log::info;

use crate::errors::{AppError, AppResult};

pub mod frames;
pub mod probe;

/// Verify that ffmpeg and ffprobe are reachable on PATH before starting any
/// work that shells out to them.
pub fn ensure_tools() -> AppResult<()> {
    for tool in ["ffmpeg", "ffprobe"] {
        let path = which::which(tool).map_err(|_| {
            AppError::ConfigurationError(format!(
                "{} not found in PATH. Install ffmpeg to process video frames.",
                tool
            ))
        })?;
        info!("Found {} at {}", tool, path.display());
    }
    Ok(())
}
