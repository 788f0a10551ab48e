//! Ad script generation.

use std::sync::Arc;

use log::info;
use serde_json::json;

use crate::clients::openai::OpenAiApi;
use crate::errors::{AppError, AppResult};
use crate::models::ScriptResponse;
use crate::prompts::build_script_prompt;
use crate::utils::common::extract_output_text;

pub const SCRIPT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a creative director writing concise ad scripts for premium brands. Only output the script, no other text.";

pub struct ScriptService {
    api: Arc<dyn OpenAiApi>,
}

impl ScriptService {
    pub fn new(api: Arc<dyn OpenAiApi>) -> Self {
        Self { api }
    }

    /// Generate a timestamped video script from an ad brief, optionally
    /// grounded in a reference image.
    pub async fn generate_script(
        &self,
        brief: &str,
        seconds: u32,
        image_data_url: Option<&str>,
    ) -> AppResult<ScriptResponse> {
        info!(
            "Generating script: {}s brief, {} chars, image: {}",
            seconds,
            brief.len(),
            image_data_url.is_some()
        );

        let script_prompt = build_script_prompt(brief, seconds);

        let mut user_content = vec![json!({ "type": "input_text", "text": script_prompt })];
        if let Some(image_url) = image_data_url {
            user_content.push(json!({ "type": "input_image", "image_url": image_url }));
        }
        let input = json!([
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": user_content }
        ]);

        let response = self.api.generate_response(input, SCRIPT_MODEL).await?;

        let script = extract_output_text(&response).trim().to_string();
        if script.is_empty() {
            return Err(AppError::ApiError(
                "No script returned from the API".to_string(),
            ));
        }

        info!("Script generated: {} chars", script.len());
        Ok(ScriptResponse { script })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::openai::test_support::MockOpenAi;
    use serde_json::Value;

    #[tokio::test]
    async fn test_generate_script_extracts_output_text() {
        let mock = Arc::new(MockOpenAi::default());
        *mock.response_result.lock().unwrap() = Some(Ok(json!({
            "output_text": "  [00:00-00:04] Hero shot of the bottle.  "
        })));

        let service = ScriptService::new(mock.clone());
        let result = service.generate_script("sell a bottle", 4, None).await.unwrap();
        assert_eq!(result.script, "[00:00-00:04] Hero shot of the bottle.");

        let calls = mock.response_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, SCRIPT_MODEL);
        let user_content = &calls[0].0[1]["content"];
        assert_eq!(user_content.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_script_attaches_reference_image() {
        let mock = Arc::new(MockOpenAi::default());
        *mock.response_result.lock().unwrap() = Some(Ok(json!({ "output_text": "[00:00-00:04] A" })));

        let service = ScriptService::new(mock.clone());
        service
            .generate_script("brief", 4, Some("data:image/png;base64,aGk="))
            .await
            .unwrap();

        let calls = mock.response_calls.lock().unwrap();
        let user_content = calls[0].0[1]["content"].as_array().unwrap().clone();
        assert_eq!(user_content.len(), 2);
        assert_eq!(user_content[1]["type"], Value::from("input_image"));
    }

    #[tokio::test]
    async fn test_generate_script_rejects_empty_output() {
        let mock = Arc::new(MockOpenAi::default());
        *mock.response_result.lock().unwrap() = Some(Ok(json!({})));

        let service = ScriptService::new(mock);
        let error = service.generate_script("brief", 4, None).await.unwrap_err();
        assert!(error.to_string().contains("No script returned from the API"));
    }
}
