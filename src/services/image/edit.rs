//! Refinement edits on an existing image.

use std::sync::Arc;

use log::info;

use crate::clients::openai::{GeneratedImage, ImageEditRequest, ImagePayload, OpenAiApi};
use crate::errors::AppResult;
use crate::prompts::build_regenerate_prompt;
use crate::services::image::{IMAGE_FIDELITY, IMAGE_OUTPUT_FORMAT, IMAGE_SIZE};
use crate::utils::common::DecodedImage;

pub struct EditService {
    api: Arc<dyn OpenAiApi>,
}

impl EditService {
    pub fn new(api: Arc<dyn OpenAiApi>) -> Self {
        Self { api }
    }

    /// Apply the user's edit instructions to a previously generated image.
    pub async fn edit_image(
        &self,
        image: DecodedImage,
        user_prompt: Option<&str>,
    ) -> AppResult<GeneratedImage> {
        info!(
            "Editing image: {} bytes, prompt: {}",
            image.bytes.len(),
            user_prompt.is_some()
        );

        let prompt = build_regenerate_prompt(user_prompt);
        let result = self
            .api
            .edit_images(ImageEditRequest {
                images: vec![ImagePayload {
                    bytes: image.bytes,
                    mime: image.mime,
                    name: "source.png".to_string(),
                }],
                prompt,
                size: IMAGE_SIZE.to_string(),
                fidelity: IMAGE_FIDELITY.to_string(),
                output_format: IMAGE_OUTPUT_FORMAT.to_string(),
            })
            .await?;

        info!("Edit complete: {} base64 chars", result.base64.len());
        Ok(result)
    }
}
