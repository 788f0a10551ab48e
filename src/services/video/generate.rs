//! Script-to-video generation.

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::imageops::FilterType;
use log::info;

use crate::clients::openai::{OpenAiApi, VideoJob, VideoStatus};
use crate::errors::{AppError, AppResult};
use crate::prompts::build_video_prompt;
use crate::services::video::{VIDEO_HEIGHT, VIDEO_SIZE, VIDEO_WIDTH};

pub struct VideoService {
    api: Arc<dyn OpenAiApi>,
}

impl VideoService {
    pub fn new(api: Arc<dyn OpenAiApi>) -> Self {
        Self { api }
    }

    /// Queue a video generation job from a timestamped script and a reference
    /// image. The reference is resized to the video frame before upload.
    pub async fn generate_video(
        &self,
        script: &str,
        image_bytes: &[u8],
        seconds: u32,
    ) -> AppResult<VideoJob> {
        info!("Generating video: {}s, script {} chars", seconds, script.len());

        let reference = resize_reference(image_bytes)?;
        let prompt = build_video_prompt(script);

        let job = self
            .api
            .create_video(&prompt, reference, VIDEO_SIZE, seconds)
            .await?;

        info!("Video job queued: {} ({})", job.id, job.status);
        Ok(job)
    }

    pub async fn status(&self, video_id: &str) -> AppResult<VideoStatus> {
        let status = self.api.video_status(video_id).await?;
        info!("Video {} status: {}", video_id, status.status);
        Ok(status)
    }

    pub async fn content(&self, video_id: &str) -> AppResult<Bytes> {
        let bytes = self.api.video_content(video_id).await?;
        info!("Video {} content: {} bytes", video_id, bytes.len());
        Ok(bytes)
    }
}

/// Cover-fit the reference image to the video frame and re-encode as JPEG.
fn resize_reference(image_bytes: &[u8]) -> AppResult<Vec<u8>> {
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| AppError::MediaError(format!("Failed to decode reference image: {}", e)))?;

    let resized = decoded.resize_to_fill(VIDEO_WIDTH, VIDEO_HEIGHT, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .map_err(|e| AppError::MediaError(format!("Failed to encode reference image: {}", e)))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::openai::test_support::MockOpenAi;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let buffer = image::RgbImage::from_pixel(width, height, image::Rgb([120, 40, 200]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(buffer)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_resize_reference_produces_jpeg_at_video_size() {
        let jpeg = resize_reference(&png_fixture(100, 100)).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), VIDEO_WIDTH);
        assert_eq!(decoded.height(), VIDEO_HEIGHT);
        // JPEG SOI marker
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
    }

    #[test]
    fn test_resize_reference_rejects_garbage() {
        let error = resize_reference(b"not an image").unwrap_err();
        assert!(error.to_string().contains("Failed to decode reference image"));
    }

    #[tokio::test]
    async fn test_generate_video_wraps_script_in_cinematic_prompt() {
        let mock = Arc::new(MockOpenAi::default());
        *mock.create_video_result.lock().unwrap() = Some(Ok(VideoJob {
            id: "video_123".to_string(),
            status: "queued".to_string(),
        }));

        let service = VideoService::new(mock.clone());
        let job = service
            .generate_video("[00:00-00:04] Hero shot", &png_fixture(64, 64), 4)
            .await
            .unwrap();
        assert_eq!(job.id, "video_123");

        let calls = mock.create_video_calls.lock().unwrap();
        let (prompt, reference_len, size, seconds) = &calls[0];
        assert!(prompt.contains("Optimized Shot List (1 shots / 4 s total)"));
        assert!(prompt.contains("[00:00-00:04] Hero shot"));
        assert!(*reference_len > 0);
        assert_eq!(size, VIDEO_SIZE);
        assert_eq!(*seconds, 4);
    }

    #[tokio::test]
    async fn test_generate_video_fails_before_upload_on_bad_image() {
        let mock = Arc::new(MockOpenAi::default());
        let service = VideoService::new(mock.clone());

        let result = service.generate_video("[00:00-00:04] A", b"junk", 4).await;
        assert!(result.is_err());
        assert!(mock.create_video_calls.lock().unwrap().is_empty());
    }
}
