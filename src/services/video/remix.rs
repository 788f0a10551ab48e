//! Remixing an existing generated video with a new prompt.

use std::sync::Arc;

use log::info;

use crate::clients::openai::{OpenAiApi, VideoJob};
use crate::errors::AppResult;

pub struct RemixService {
    api: Arc<dyn OpenAiApi>,
}

impl RemixService {
    pub fn new(api: Arc<dyn OpenAiApi>) -> Self {
        Self { api }
    }

    /// Queue a remix of an existing video. Returns the new job, the source
    /// video is left untouched.
    pub async fn remix_video(&self, video_id: &str, prompt: &str) -> AppResult<VideoJob> {
        info!("Remixing video {}: {} chars", video_id, prompt.len());

        let job = self.api.remix_video(video_id, prompt).await?;

        info!("Remix queued: {} ({})", job.id, job.status);
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::openai::test_support::MockOpenAi;

    #[tokio::test]
    async fn test_remix_returns_new_job_id() {
        let mock = Arc::new(MockOpenAi::default());
        *mock.remix_result.lock().unwrap() = Some(Ok(VideoJob {
            id: "video_new".to_string(),
            status: "queued".to_string(),
        }));

        let service = RemixService::new(mock.clone());
        let job = service
            .remix_video("video_old", "Convert to black and white")
            .await
            .unwrap();
        assert_eq!(job.id, "video_new");

        let calls = mock.remix_calls.lock().unwrap();
        assert_eq!(calls[0].0, "video_old");
        assert_eq!(calls[0].1, "Convert to black and white");
    }
}
