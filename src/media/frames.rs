//! Frame sampling and extraction.
//!
//! Eval graders judge a video by a handful of still frames. Timestamps are
//! spread evenly across the clip while avoiding the first and last instants,
//! which tend to be fade-ins and fade-outs rather than representative content.

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use log::info;
use tokio::process::Command;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::media::probe::probe_duration;
use crate::utils::common::bytes_to_data_url;

pub const DEFAULT_FRAME_COUNT: usize = 8;

/// Where in the clip to grab a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePosition {
    Middle,
    At(f64),
}

/// Evenly spread timestamps for a clip of known duration.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSampleSet {
    pub timestamps: Vec<f64>,
    pub duration: f64,
}

/// Frames written to disk, paired with the timestamps they were taken at.
#[derive(Debug)]
pub struct ExtractedFrames {
    pub frames: Vec<PathBuf>,
    pub timestamps: Vec<f64>,
    pub duration: f64,
}

/// Compute `count` seek timestamps for a clip `duration` seconds long.
///
/// The window starts at `min(0.5, 10% of duration)` and ends at
/// `max(duration - 0.5, 90% of duration)`, so short clips still keep their
/// samples inside the clip. A single requested frame lands at the midpoint.
pub fn sample_timestamps(duration: f64, count: usize) -> AppResult<FrameSampleSet> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(AppError::MediaError(format!(
            "Invalid video duration: {}",
            duration
        )));
    }
    if duration < 1.0 {
        return Err(AppError::MediaError(format!(
            "Video too short to sample frames: {:.3}s",
            duration
        )));
    }

    if count <= 1 {
        return Ok(FrameSampleSet {
            timestamps: vec![duration / 2.0],
            duration,
        });
    }

    let start = (0.1 * duration).min(0.5);
    let end = (duration - 0.5).max(0.9 * duration);
    let interval = (end - start) / (count - 1) as f64;

    let timestamps = (0..count).map(|i| start + interval * i as f64).collect();
    Ok(FrameSampleSet {
        timestamps,
        duration,
    })
}

/// Extract `count` evenly spaced frames from a video as PNG files.
///
/// Frames land in `output_dir` when given, otherwise in a fresh directory
/// under the system temp dir. Extractions run concurrently; one ffmpeg
/// process per timestamp.
pub async fn extract_frames(
    video_path: &Path,
    count: usize,
    output_dir: Option<&Path>,
) -> AppResult<ExtractedFrames> {
    let duration = probe_duration(video_path).await?;
    let samples = sample_timestamps(duration, count)?;

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::temp_dir().join(format!("campaign-frames-{}", Uuid::new_v4())),
    };
    tokio::fs::create_dir_all(&dir).await?;

    info!(
        "Extracting {} frames from {} ({:.1}s)",
        samples.timestamps.len(),
        video_path.display(),
        duration
    );

    let jobs = samples.timestamps.iter().enumerate().map(|(index, &ts)| {
        let output = dir.join(format!("frame-{:02}.png", index + 1));
        let video = video_path.to_path_buf();
        async move {
            write_frame(&video, ts, &output).await?;
            Ok::<PathBuf, AppError>(output)
        }
    });

    let frames = try_join_all(jobs).await?;
    Ok(ExtractedFrames {
        frames,
        timestamps: samples.timestamps,
        duration,
    })
}

/// Extract one frame, either from the clip's midpoint or a fixed timestamp.
pub async fn extract_single_frame(
    video_path: &Path,
    position: FramePosition,
    output_path: &Path,
) -> AppResult<f64> {
    let timestamp = match position {
        FramePosition::At(ts) => ts,
        FramePosition::Middle => probe_duration(video_path).await? / 2.0,
    };
    write_frame(video_path, timestamp, output_path).await?;
    Ok(timestamp)
}

async fn write_frame(video_path: &Path, timestamp: f64, output_path: &Path) -> AppResult<()> {
    let output = Command::new("ffmpeg")
        .args(["-y", "-ss", &format!("{:.3}", timestamp), "-i"])
        .arg(video_path)
        .args(["-vframes", "1", "-q:v", "2"])
        .arg(output_path)
        .output()
        .await
        .map_err(|e| AppError::MediaError(format!("Failed to run ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::MediaError(format!(
            "ffmpeg failed at {:.3}s: {}",
            timestamp,
            stderr.trim()
        )));
    }
    Ok(())
}

/// Load extracted frames back as base64 PNG data URLs for the Responses API.
pub async fn frames_to_data_urls(frames: &[PathBuf]) -> AppResult<Vec<String>> {
    let mut urls = Vec::with_capacity(frames.len());
    for frame in frames {
        let bytes = tokio::fs::read(frame).await?;
        urls.push(bytes_to_data_url(&bytes, "image/png"));
    }
    Ok(urls)
}

/// Best-effort removal of extracted frames and their directory.
pub async fn cleanup_frames(frames: &[PathBuf]) {
    for frame in frames {
        let _ = tokio::fs::remove_file(frame).await;
    }
    if let Some(dir) = frames.first().and_then(|frame| frame.parent()) {
        let _ = tokio::fs::remove_dir(dir).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn test_sample_timestamps_ten_second_clip() {
        let samples = sample_timestamps(10.0, 8).unwrap();
        assert_eq!(samples.timestamps.len(), 8);
        assert_close(samples.timestamps[0], 0.5);
        assert_close(samples.timestamps[7], 9.5);
        // Evenly spaced at 9/7s intervals
        let interval = samples.timestamps[1] - samples.timestamps[0];
        assert_close(interval, 9.0 / 7.0);
        for pair in samples.timestamps.windows(2) {
            assert_close(pair[1] - pair[0], interval);
        }
    }

    #[test]
    fn test_sample_timestamps_short_clip_stays_inside() {
        let samples = sample_timestamps(3.0, 4).unwrap();
        assert_close(samples.timestamps[0], 0.3);
        assert_close(samples.timestamps[3], 2.7);
        assert!(samples.timestamps.iter().all(|&ts| ts > 0.0 && ts < 3.0));
    }

    #[test]
    fn test_sample_timestamps_single_frame_is_midpoint() {
        let samples = sample_timestamps(8.0, 1).unwrap();
        assert_eq!(samples.timestamps.len(), 1);
        assert_close(samples.timestamps[0], 4.0);
    }

    #[test]
    fn test_sample_timestamps_zero_count_behaves_like_one() {
        let samples = sample_timestamps(8.0, 0).unwrap();
        assert_eq!(samples.timestamps.len(), 1);
        assert_close(samples.timestamps[0], 4.0);
    }

    #[test]
    fn test_sample_timestamps_monotonic() {
        let samples = sample_timestamps(12.0, DEFAULT_FRAME_COUNT).unwrap();
        for pair in samples.timestamps.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_sample_timestamps_rejects_sub_second_clip() {
        let error = sample_timestamps(0.4, 8).unwrap_err();
        assert!(error.to_string().contains("too short"));
    }

    #[test]
    fn test_sample_timestamps_rejects_invalid_duration() {
        assert!(sample_timestamps(0.0, 8).is_err());
        assert!(sample_timestamps(-2.0, 8).is_err());
        assert!(sample_timestamps(f64::NAN, 8).is_err());
        assert!(sample_timestamps(f64::INFINITY, 8).is_err());
    }
}
