//! OpenAI API client.
//!
//! Thin wrapper over the Images, Responses, Videos, Files and Evals
//! endpoints. Upstream error messages are forwarded verbatim; each call has
//! its own generic fallback for responses with no parseable error body.
//!
//! Services depend on the [`OpenAiApi`] trait so tests can substitute a mock.
//! The eval tooling talks to the concrete [`OpenAiClient`] directly.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

pub const IMAGE_MODEL: &str = "gpt-image-1";
pub const VIDEO_MODEL: &str = "sora-2-pro";

/// Raw image bytes with the metadata multipart uploads need.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub name: String,
}

/// Parameters for the `/images/edits` endpoint.
#[derive(Debug, Clone)]
pub struct ImageEditRequest {
    pub images: Vec<ImagePayload>,
    pub prompt: String,
    pub size: String,
    pub fidelity: String,
    pub output_format: String,
}

/// A generated or edited image, base64-encoded as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedImage {
    pub base64: String,
    pub mime: String,
}

/// A queued video generation or remix job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoJob {
    pub id: String,
    pub status: String,
}

/// Lifecycle snapshot of a video job.
#[derive(Debug, Clone, Serialize)]
pub struct VideoStatus {
    pub status: String,
    pub error: Option<String>,
}

/// The subset of OpenAI operations the request-serving services need.
#[async_trait]
pub trait OpenAiApi: Send + Sync {
    async fn edit_images(&self, request: ImageEditRequest) -> AppResult<GeneratedImage>;
    async fn generate_response(&self, input: Value, model: &str) -> AppResult<Value>;
    async fn create_video(
        &self,
        prompt: &str,
        reference_jpeg: Vec<u8>,
        size: &str,
        seconds: u32,
    ) -> AppResult<VideoJob>;
    async fn video_status(&self, video_id: &str) -> AppResult<VideoStatus>;
    async fn video_content(&self, video_id: &str) -> AppResult<Bytes>;
    async fn remix_video(&self, video_id: &str, prompt: &str) -> AppResult<VideoJob>;
    async fn analyze_image(
        &self,
        image_data_url: &str,
        prompt: &str,
        model: &str,
    ) -> AppResult<Value>;
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Parse a response body as JSON, mapping non-2xx statuses to the
    /// upstream `error.message` when present, otherwise to `fallback`.
    async fn json_or_error(&self, response: reqwest::Response, fallback: &str) -> AppResult<Value> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(AppError::ApiError(upstream_message(&body, fallback)));
        }
        Ok(body)
    }
}

/// Pull `error.message` out of an upstream error body, falling back to an
/// endpoint-specific generic message.
fn upstream_message(body: &Value, fallback: &str) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl OpenAiApi for OpenAiClient {
    async fn edit_images(&self, request: ImageEditRequest) -> AppResult<GeneratedImage> {
        let mut form = Form::new()
            .text("model", IMAGE_MODEL)
            .text("prompt", request.prompt)
            .text("input_fidelity", request.fidelity)
            .text("size", request.size)
            .text("output_format", request.output_format.clone());

        for image in request.images {
            let part = Part::bytes(image.bytes)
                .file_name(image.name)
                .mime_str(&image.mime)?;
            form = form.part("image[]", part);
        }

        let response = self
            .client
            .post(self.url("/images/edits"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let body = self.json_or_error(response, "Image editing failed").await?;

        let base64 = body
            .pointer("/data/0/b64_json")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::ApiError("No image returned from the API".to_string()))?;

        Ok(GeneratedImage {
            base64: base64.to_string(),
            mime: format!("image/{}", request.output_format),
        })
    }

    async fn generate_response(&self, input: Value, model: &str) -> AppResult<Value> {
        let response = self
            .client
            .post(self.url("/responses"))
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": model, "input": input }))
            .send()
            .await?;
        self.json_or_error(response, "Response generation failed")
            .await
    }

    async fn create_video(
        &self,
        prompt: &str,
        reference_jpeg: Vec<u8>,
        size: &str,
        seconds: u32,
    ) -> AppResult<VideoJob> {
        let reference = Part::bytes(reference_jpeg)
            .file_name("reference.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .text("model", VIDEO_MODEL)
            .text("prompt", prompt.to_string())
            .text("size", size.to_string())
            .text("seconds", seconds.to_string())
            .part("input_reference", reference);

        let response = self
            .client
            .post(self.url("/videos"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let body = self
            .json_or_error(response, "Video generation failed")
            .await?;

        Ok(serde_json::from_value(body)?)
    }

    async fn video_status(&self, video_id: &str) -> AppResult<VideoStatus> {
        let response = self
            .client
            .get(self.url(&format!("/videos/{}", video_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body = self.json_or_error(response, "Unable to fetch status").await?;

        Ok(VideoStatus {
            status: body
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            error: body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    async fn video_content(&self, video_id: &str) -> AppResult<Bytes> {
        let response = self
            .client
            .get(self.url(&format!("/videos/{}/content", video_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(AppError::ApiError(upstream_message(
                &body,
                "Unable to fetch video",
            )));
        }

        Ok(response.bytes().await?)
    }

    async fn remix_video(&self, video_id: &str, prompt: &str) -> AppResult<VideoJob> {
        let response = self
            .client
            .post(self.url(&format!("/videos/{}/remix", video_id)))
            .bearer_auth(&self.api_key)
            .json(&json!({ "prompt": prompt }))
            .send()
            .await?;
        let body = self.json_or_error(response, "Remix failed").await?;

        Ok(serde_json::from_value(body)?)
    }

    async fn analyze_image(
        &self,
        image_data_url: &str,
        prompt: &str,
        model: &str,
    ) -> AppResult<Value> {
        let input = json!([
            {
                "role": "user",
                "content": [
                    { "type": "input_text", "text": prompt },
                    { "type": "input_image", "image_url": image_data_url }
                ]
            }
        ]);
        let response = self
            .client
            .post(self.url("/responses"))
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": model, "input": input }))
            .send()
            .await?;
        self.json_or_error(response, "Image analysis failed").await
    }
}

/// Pass/fail tallies for a completed eval run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultCounts {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub passed: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub errored: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRun {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub report_url: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub result_counts: Option<ResultCounts>,
}

impl EvalRun {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|error| match error.as_str() {
            Some(text) => text.to_string(),
            None => error.to_string(),
        })
    }
}

/// Eval-harness operations. These live on the concrete client because the
/// eval CLI always talks to the real API.
impl OpenAiClient {
    /// Generate a standalone image via `/images/generations`.
    pub async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
        quality: &str,
        background: Option<&str>,
    ) -> AppResult<Vec<u8>> {
        let mut payload = json!({
            "model": IMAGE_MODEL,
            "prompt": prompt,
            "n": 1,
            "size": size,
            "quality": quality
        });
        if let Some(background) = background {
            payload["background"] = json!(background);
        }

        let response = self
            .client
            .post(self.url("/images/generations"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let body = self
            .json_or_error(response, "Image generation failed")
            .await?;

        let base64 = body
            .pointer("/data/0/b64_json")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::ApiError("No image returned from the API".to_string()))?;

        use base64::Engine;
        base64::prelude::BASE64_STANDARD
            .decode(base64)
            .map_err(|e| AppError::ApiError(format!("Invalid image payload from the API: {}", e)))
    }

    /// Create an eval configuration, returning its id.
    pub async fn create_eval(&self, payload: Value) -> AppResult<String> {
        let response = self
            .client
            .post(self.url("/evals"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let body = self.json_or_error(response, "Eval creation failed").await?;

        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::ApiError("No eval id returned from the API".to_string()))
    }

    /// Upload a JSONL dataset with `purpose=evals`, returning the file id.
    pub async fn upload_evals_file(&self, jsonl: String, filename: &str) -> AppResult<String> {
        let part = Part::bytes(jsonl.into_bytes())
            .file_name(filename.to_string())
            .mime_str("application/jsonl")?;
        let form = Form::new().text("purpose", "evals").part("file", part);

        let response = self
            .client
            .post(self.url("/files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let body = self.json_or_error(response, "File upload failed").await?;

        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::ApiError("No file id returned from the API".to_string()))
    }

    /// Start an eval run against an uploaded JSONL dataset.
    pub async fn create_eval_run(
        &self,
        eval_id: &str,
        name: &str,
        file_id: &str,
    ) -> AppResult<EvalRun> {
        let payload = json!({
            "name": name,
            "data_source": {
                "type": "jsonl",
                "source": { "type": "file_id", "id": file_id }
            }
        });

        let response = self
            .client
            .post(self.url(&format!("/evals/{}/runs", eval_id)))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let body = self
            .json_or_error(response, "Eval run creation failed")
            .await?;

        Ok(serde_json::from_value(body)?)
    }

    /// Fetch the current state of an eval run.
    pub async fn eval_run(&self, eval_id: &str, run_id: &str) -> AppResult<EvalRun> {
        let response = self
            .client
            .get(self.url(&format!("/evals/{}/runs/{}", eval_id, run_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body = self
            .json_or_error(response, "Unable to fetch eval run")
            .await?;

        Ok(serde_json::from_value(body)?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_prefers_error_body() {
        let body = serde_json::json!({ "error": { "message": "Billing hard limit reached" } });
        assert_eq!(upstream_message(&body, "fallback"), "Billing hard limit reached");
    }

    #[test]
    fn test_upstream_message_falls_back() {
        assert_eq!(upstream_message(&Value::Null, "Video generation failed"), "Video generation failed");
        let body = serde_json::json!({ "error": "not an object" });
        assert_eq!(upstream_message(&body, "fallback"), "fallback");
    }

    #[test]
    fn test_eval_run_error_message_handles_both_shapes() {
        let run: EvalRun =
            serde_json::from_value(serde_json::json!({ "id": "run_1", "status": "failed", "error": "boom" }))
                .unwrap();
        assert_eq!(run.error_message().as_deref(), Some("boom"));

        let run: EvalRun = serde_json::from_value(
            serde_json::json!({ "id": "run_2", "status": "failed", "error": { "code": "rate_limited" } }),
        )
        .unwrap();
        assert!(run.error_message().unwrap().contains("rate_limited"));
    }

    #[test]
    fn test_eval_run_parses_minimal_payload() {
        let run: EvalRun =
            serde_json::from_value(serde_json::json!({ "id": "run_3", "status": "queued" })).unwrap();
        assert!(run.report_url.is_none());
        assert!(run.result_counts.is_none());
    }
}
