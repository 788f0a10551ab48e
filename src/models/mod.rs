//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

/// Video durations the video model accepts, in seconds.
pub const ALLOWED_DURATIONS: [u32; 3] = [4, 8, 12];

fn default_seconds() -> u32 {
    4
}

#[derive(Debug, Deserialize)]
pub struct GenerateScriptRequest {
    pub prompt: Option<String>,
    #[serde(default = "default_seconds")]
    pub seconds: u32,
    /// Optional reference image as a base64 data URL.
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScriptResponse {
    pub script: String,
}

#[derive(Debug, Deserialize)]
pub struct EditImageRequest {
    pub image: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateVideoRequest {
    pub prompt: Option<String>,
    pub image: Option<String>,
    #[serde(default = "default_seconds")]
    pub seconds: u32,
}

#[derive(Debug, Deserialize)]
pub struct RemixRequest {
    pub prompt: Option<String>,
}
