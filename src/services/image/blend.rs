//! Product-into-scene image blending.

use std::sync::Arc;

use log::info;

use crate::clients::openai::{GeneratedImage, ImageEditRequest, ImagePayload, OpenAiApi};
use crate::errors::AppResult;
use crate::prompts::build_image_prompt;
use crate::services::image::{IMAGE_FIDELITY, IMAGE_OUTPUT_FORMAT, IMAGE_SIZE};

pub struct BlendService {
    api: Arc<dyn OpenAiApi>,
}

impl BlendService {
    pub fn new(api: Arc<dyn OpenAiApi>) -> Self {
        Self { api }
    }

    /// Composite a product image into a scene image. Image order matters, the
    /// prompt refers to "image 1" and "image 2".
    pub async fn blend_images(
        &self,
        object_image: ImagePayload,
        scene_image: ImagePayload,
        user_prompt: Option<&str>,
    ) -> AppResult<GeneratedImage> {
        info!(
            "Blending {} into {} (prompt: {})",
            object_image.name,
            scene_image.name,
            user_prompt.is_some()
        );

        let prompt = build_image_prompt(user_prompt);
        let result = self
            .api
            .edit_images(ImageEditRequest {
                images: vec![object_image, scene_image],
                prompt,
                size: IMAGE_SIZE.to_string(),
                fidelity: IMAGE_FIDELITY.to_string(),
                output_format: IMAGE_OUTPUT_FORMAT.to_string(),
            })
            .await?;

        info!("Blend complete: {} base64 chars", result.base64.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::openai::test_support::MockOpenAi;

    fn payload(name: &str) -> ImagePayload {
        ImagePayload {
            bytes: vec![1, 2, 3],
            mime: "image/png".to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_blend_sends_object_before_scene() {
        let mock = Arc::new(MockOpenAi::default());
        *mock.edit_result.lock().unwrap() = Some(Ok(GeneratedImage {
            base64: "aGk=".to_string(),
            mime: "image/png".to_string(),
        }));

        let service = BlendService::new(mock.clone());
        service
            .blend_images(payload("bottle.png"), payload("kitchen.png"), Some("at dawn"))
            .await
            .unwrap();

        let calls = mock.edit_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].images[0].name, "bottle.png");
        assert_eq!(calls[0].images[1].name, "kitchen.png");
        assert_eq!(calls[0].size, IMAGE_SIZE);
        assert!(calls[0].prompt.starts_with("Use image 1 as the subject"));
        assert!(calls[0].prompt.ends_with("at dawn"));
    }

    #[tokio::test]
    async fn test_blend_propagates_api_error() {
        let mock = Arc::new(MockOpenAi::default());
        *mock.edit_result.lock().unwrap() = Some(Err("Image editing failed".to_string()));

        let service = BlendService::new(mock);
        let error = service
            .blend_images(payload("a.png"), payload("b.png"), None)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Image editing failed"));
    }
}
