//! Common utility functions used across the application

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static DATA_URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:(image/[a-zA-Z0-9.+-]+);base64,(.+)$").unwrap());

/// An inline image decoded from a `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Decode a base64 image data URL. Returns `None` for anything that is not a
/// well-formed image data URL, including undecodable base64 payloads.
pub fn data_url_to_bytes(data_url: &str) -> Option<DecodedImage> {
    let captures = DATA_URL_PATTERN.captures(data_url)?;
    let mime = captures.get(1)?.as_str().to_string();
    let bytes = BASE64_STANDARD.decode(captures.get(2)?.as_str()).ok()?;
    Some(DecodedImage { mime, bytes })
}

/// Encode raw bytes as a base64 data URL, the only inline-image wire format.
pub fn bytes_to_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(bytes))
}

/// Pull the assistant text out of a Responses API payload. Handles both the
/// `output_text` shortcut and the nested `output[].content[]` form.
pub fn extract_output_text(data: &Value) -> String {
    if let Some(text) = data.get("output_text").and_then(Value::as_str) {
        return text.to_string();
    }

    if let Some(output) = data.get("output").and_then(Value::as_array) {
        for item in output {
            if let Some(content) = item.get("content").and_then(Value::as_array) {
                for part in content {
                    if part.get("type").and_then(Value::as_str) == Some("output_text") {
                        if let Some(text) = part.get("text").and_then(Value::as_str) {
                            return text.to_string();
                        }
                    }
                }
            }
        }
    }

    String::new()
}
