//! Video metadata queries via ffprobe.

use std::path::Path;

use tokio::process::Command;

use crate::errors::{AppError, AppResult};

/// Get a video's duration in seconds.
pub async fn probe_duration(video_path: &Path) -> AppResult<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(video_path)
        .output()
        .await
        .map_err(|e| AppError::MediaError(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::MediaError(format!(
            "ffprobe failed for {}: {}",
            video_path.display(),
            stderr.trim()
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::MediaError("Could not determine video duration".to_string()))
}
