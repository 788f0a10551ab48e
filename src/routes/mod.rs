//! HTTP API surface.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use log::info;

use crate::clients::openai::{GeneratedImage, ImagePayload, OpenAiApi, VideoJob, VideoStatus};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ALLOWED_DURATIONS, EditImageRequest, GenerateScriptRequest, GenerateVideoRequest, RemixRequest,
    ScriptResponse,
};
use crate::services::image::blend::BlendService;
use crate::services::image::edit::EditService;
use crate::services::image::validate::ValidationService;
use crate::services::script::ScriptService;
use crate::services::video::generate::VideoService;
use crate::services::video::remix::RemixService;
use crate::utils::common::{bytes_to_data_url, data_url_to_bytes};

/// JSON bodies carry base64 images, so the limit is well above raw upload sizes.
const BODY_LIMIT: usize = 15 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub script: Arc<ScriptService>,
    pub blend: Arc<BlendService>,
    pub edit: Arc<EditService>,
    pub validate: Arc<ValidationService>,
    pub video: Arc<VideoService>,
    pub remix: Arc<RemixService>,
}

impl AppState {
    pub fn new(api: Arc<dyn OpenAiApi>) -> Self {
        Self {
            script: Arc::new(ScriptService::new(api.clone())),
            blend: Arc::new(BlendService::new(api.clone())),
            edit: Arc::new(EditService::new(api.clone())),
            validate: Arc::new(ValidationService::new(api.clone())),
            video: Arc::new(VideoService::new(api.clone())),
            remix: Arc::new(RemixService::new(api)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate-video-script", post(generate_script))
        .route("/api/generate-image", post(generate_image))
        .route("/api/edit-image", post(edit_image))
        .route("/api/generate-video", post(generate_video))
        .route("/api/video/:id", get(video_status))
        .route("/api/video/:id/content", get(video_content))
        .route("/api/video/:id/remix", post(remix_video))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    info!("[request] {} {}", method, path);

    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        "[response] {} {} {} ({}ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// Unwrap a JSON body, mapping extractor rejections (malformed JSON, wrong
/// field types) to the same `{"message": ...}` 400 shape as hand-written
/// validation.
fn require_json<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    let Json(value) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    Ok(value)
}

fn check_duration(seconds: u32) -> AppResult<()> {
    if !ALLOWED_DURATIONS.contains(&seconds) {
        return Err(AppError::InvalidRequest(
            "Duration must be 4, 8, or 12 seconds.".to_string(),
        ));
    }
    Ok(())
}

async fn generate_script(
    State(state): State<AppState>,
    payload: Result<Json<GenerateScriptRequest>, JsonRejection>,
) -> AppResult<Json<ScriptResponse>> {
    let request = require_json(payload)?;
    let prompt = request
        .prompt
        .as_deref()
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Prompt is required.".to_string()))?;
    check_duration(request.seconds)?;
    if let Some(image) = &request.image {
        if data_url_to_bytes(image).is_none() {
            return Err(AppError::InvalidRequest("Invalid image payload.".to_string()));
        }
    }

    let result = state
        .script
        .generate_script(prompt, request.seconds, request.image.as_deref())
        .await?;
    Ok(Json(result))
}

/// One uploaded image from the blend form.
struct UploadedImage {
    payload: ImagePayload,
}

async fn generate_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<GeneratedImage>> {
    let mut object_image: Option<UploadedImage> = None;
    let mut scene_image: Option<UploadedImage> = None;
    let mut prompt: Option<String> = None;
    let mut skip_validation = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "objectImage" | "sceneImage" => {
                let mime = field.content_type().unwrap_or_default().to_string();
                if !mime.starts_with("image/") {
                    return Err(AppError::InvalidRequest(
                        "Only image files are allowed.".to_string(),
                    ));
                }
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
                let uploaded = UploadedImage {
                    payload: ImagePayload {
                        bytes: bytes.to_vec(),
                        mime,
                        name: file_name,
                    },
                };
                if name == "objectImage" {
                    object_image = Some(uploaded);
                } else {
                    scene_image = Some(uploaded);
                }
            }
            "prompt" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
                let text = text.trim().to_string();
                if !text.is_empty() {
                    prompt = Some(text);
                }
            }
            "skipValidation" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
                skip_validation = text == "true";
            }
            _ => {}
        }
    }

    let (object_image, scene_image) = match (object_image, scene_image) {
        (Some(object), Some(scene)) => (object, scene),
        _ => {
            return Err(AppError::InvalidRequest(
                "Both subject and scene images are required.".to_string(),
            ));
        }
    };

    if !skip_validation {
        let image_data_url =
            bytes_to_data_url(&object_image.payload.bytes, &object_image.payload.mime);
        let validation = state
            .validate
            .validate_product_image(&image_data_url, prompt.as_deref())
            .await;
        if !validation.is_valid {
            return Err(AppError::ProductValidationFailed(
                validation
                    .reason
                    .unwrap_or_else(|| "Product image validation failed".to_string()),
            ));
        }
    }

    let result = state
        .blend
        .blend_images(object_image.payload, scene_image.payload, prompt.as_deref())
        .await?;
    Ok(Json(result))
}

async fn edit_image(
    State(state): State<AppState>,
    payload: Result<Json<EditImageRequest>, JsonRejection>,
) -> AppResult<Json<GeneratedImage>> {
    let request = require_json(payload)?;
    let image = request
        .image
        .as_deref()
        .ok_or_else(|| AppError::InvalidRequest("Image is required.".to_string()))?;
    let decoded = data_url_to_bytes(image)
        .ok_or_else(|| AppError::InvalidRequest("Invalid image payload.".to_string()))?;

    let prompt = request.prompt.as_deref().map(str::trim);
    let result = state.edit.edit_image(decoded, prompt).await?;
    Ok(Json(result))
}

async fn generate_video(
    State(state): State<AppState>,
    payload: Result<Json<GenerateVideoRequest>, JsonRejection>,
) -> AppResult<Json<VideoJob>> {
    let request = require_json(payload)?;
    let (prompt, image) = match (&request.prompt, &request.image) {
        (Some(prompt), Some(image)) if !prompt.is_empty() && !image.is_empty() => (prompt, image),
        _ => {
            return Err(AppError::InvalidRequest(
                "Prompt and image are required.".to_string(),
            ));
        }
    };
    check_duration(request.seconds)?;
    let decoded = data_url_to_bytes(image)
        .ok_or_else(|| AppError::InvalidRequest("Invalid image payload.".to_string()))?;

    let job = state
        .video
        .generate_video(prompt, &decoded.bytes, request.seconds)
        .await?;
    Ok(Json(job))
}

async fn video_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<VideoStatus>> {
    Ok(Json(state.video.status(&id).await?))
}

async fn video_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let bytes = state.video.content(&id).await?;
    Ok(([(header::CONTENT_TYPE, "video/mp4")], bytes).into_response())
}

async fn remix_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RemixRequest>, JsonRejection>,
) -> AppResult<Json<VideoJob>> {
    let request = require_json(payload)?;
    let prompt = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Remix prompt is required.".to_string()))?;

    let job = state.remix.remix_video(&id, prompt).await?;
    Ok(Json(job))
}
