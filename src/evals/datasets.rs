//! Eval datasets: test cases and the images they reference.

use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::clients::openai::{ImagePayload, OpenAiClient};
use crate::errors::{AppError, AppResult};

pub const TEST_CASES_FILE: &str = "test-cases.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCases {
    #[serde(default)]
    pub image_blending: Vec<ImageBlendCase>,
    #[serde(default)]
    pub video_identity: Vec<VideoIdentityCase>,
    #[serde(default)]
    pub remix: Vec<RemixCase>,
}

#[derive(Debug, Deserialize)]
pub struct ImageBlendCase {
    pub id: String,
    pub description: String,
    /// Paths relative to the datasets directory.
    pub subject: String,
    pub scene: String,
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoIdentityCase {
    pub id: String,
    pub description: String,
    pub subject: String,
    pub brief: String,
    pub seconds: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemixCase {
    pub id: String,
    pub description: String,
    pub subject: String,
    pub brief: String,
    pub seconds: u32,
    pub remix_prompt: String,
}

pub fn load_test_cases(datasets_dir: &Path) -> AppResult<TestCases> {
    let path = datasets_dir.join(TEST_CASES_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| {
        AppError::ConfigurationError(format!("Cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a dataset image, inferring the mime type from the extension.
pub fn read_image(datasets_dir: &Path, relative: &str) -> AppResult<ImagePayload> {
    let path = datasets_dir.join(relative);
    let bytes = std::fs::read(&path)?;
    let mime = match path.extension().and_then(|ext| ext.to_str()) {
        Some("png") => "image/png",
        _ => "image/jpeg",
    };
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string();
    Ok(ImagePayload {
        bytes,
        mime: mime.to_string(),
        name,
    })
}

const SUBJECT_PROMPTS: [(&str, &str); 3] = [
    (
        "subjects/subject-bottle.png",
        "Professional product photography of a single elegant glass water bottle with a minimalist blue label, isolated on a pure white background. Clean studio lighting, sharp focus, high-end commercial photography style. The bottle should be centered and fill most of the frame. No shadows, no reflections, no other objects.",
    ),
    (
        "subjects/subject-mug.png",
        "Professional product photography of a single white ceramic coffee mug with a simple modern design, isolated on a pure white background. Clean studio lighting, sharp focus, high-end commercial photography style. The mug should be centered and fill most of the frame. No shadows, no reflections, no other objects.",
    ),
    (
        "subjects/subject-sneaker.png",
        "Professional product photography of a single modern white athletic sneaker shoe, isolated on a pure white background. Clean studio lighting, sharp focus, high-end commercial photography style. The sneaker should be shown from a 3/4 angle, centered and filling most of the frame. No shadows, no reflections, no other objects.",
    ),
];

const SCENE_PROMPTS: [(&str, &str); 4] = [
    (
        "scenes/scene-kitchen.png",
        "Empty modern kitchen counter surface, marble or quartz countertop, soft natural daylight from a window on the left. Blurred kitchen cabinets in the background. No objects on the counter - completely empty surface ready for product placement. Warm, inviting atmosphere. Portrait orientation, vertical composition.",
    ),
    (
        "scenes/scene-outdoor.png",
        "Empty rustic wooden outdoor table surface in a garden setting, soft morning sunlight, blurred green foliage and flowers in the background. No objects on the table - completely empty surface ready for product placement. Natural, fresh atmosphere. Portrait orientation, vertical composition.",
    ),
    (
        "scenes/scene-studio.png",
        "Empty minimalist photography studio surface, light gray seamless backdrop, soft professional studio lighting with subtle gradient. No objects - completely empty surface ready for product placement. Clean, professional commercial photography setting. Portrait orientation, vertical composition.",
    ),
    (
        "scenes/scene-white.png",
        "Pure white background with very subtle soft gradient shadow at the bottom, professional product photography backdrop. Completely empty, no objects, no textures - just clean white space ready for product placement. Portrait orientation, vertical composition.",
    ),
];

/// Generate dataset images with the image API. Failed generations are logged
/// and skipped so a partial dataset is still usable.
pub async fn generate_test_images(client: &OpenAiClient, datasets_dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(datasets_dir.join("subjects"))?;
    std::fs::create_dir_all(datasets_dir.join("scenes"))?;

    let mut generated = 0usize;
    let total = SUBJECT_PROMPTS.len() + SCENE_PROMPTS.len();

    for (relative, prompt) in SUBJECT_PROMPTS {
        info!("Generating {}...", relative);
        match client
            .generate_image(prompt, "1024x1024", "high", Some("transparent"))
            .await
        {
            Ok(bytes) => {
                std::fs::write(datasets_dir.join(relative), &bytes)?;
                info!("Saved {} ({} KB)", relative, bytes.len() / 1024);
                generated += 1;
            }
            Err(e) => warn!("Failed to generate {}: {}", relative, e),
        }
    }

    for (relative, prompt) in SCENE_PROMPTS {
        info!("Generating {}...", relative);
        match client.generate_image(prompt, "1024x1536", "medium", None).await {
            Ok(bytes) => {
                std::fs::write(datasets_dir.join(relative), &bytes)?;
                info!("Saved {} ({} KB)", relative, bytes.len() / 1024);
                generated += 1;
            }
            Err(e) => warn!("Failed to generate {}: {}", relative, e),
        }
    }

    info!("Generated {}/{} dataset images", generated, total);
    if generated < total {
        warn!("Some images failed to generate. Re-run or add them manually.");
    }
    Ok(())
}

/// Write solid-color placeholder images so the eval pipeline can be exercised
/// without real product photos.
pub fn generate_placeholders(datasets_dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(datasets_dir.join("subjects"))?;
    std::fs::create_dir_all(datasets_dir.join("scenes"))?;

    let placeholders: [(&str, u32, u32, [u8; 3]); 7] = [
        ("subjects/subject-bottle.png", 512, 512, [0xe0, 0xe8, 0xf0]),
        ("subjects/subject-mug.png", 512, 512, [0xf0, 0xe8, 0xe0]),
        ("subjects/subject-sneaker.png", 512, 512, [0xe8, 0xf0, 0xe0]),
        ("scenes/scene-kitchen.png", 1024, 1536, [0xf5, 0xf0, 0xe8]),
        ("scenes/scene-outdoor.png", 1024, 1536, [0xe8, 0xf5, 0xe8]),
        ("scenes/scene-studio.png", 1024, 1536, [0xf0, 0xf0, 0xf0]),
        ("scenes/scene-white.png", 1024, 1536, [0xff, 0xff, 0xff]),
    ];

    for (relative, width, height, color) in placeholders {
        let path = datasets_dir.join(relative);
        let buffer = image::RgbImage::from_pixel(width, height, image::Rgb(color));
        buffer
            .save(&path)
            .map_err(|e| AppError::MediaError(format!("Failed to write {}: {}", path.display(), e)))?;
        info!("Created {}", relative);
    }

    info!("Placeholder images generated. Replace with real product/scene images for actual evaluation.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_test_cases_parses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TEST_CASES_FILE),
            r#"{
                "imageBlending": [
                    {
                        "id": "bottle-kitchen",
                        "description": "Bottle on a kitchen counter",
                        "subject": "subjects/subject-bottle.png",
                        "scene": "scenes/scene-kitchen.png",
                        "prompt": "Place the bottle on the counter"
                    }
                ],
                "videoIdentity": [
                    {
                        "id": "bottle-video",
                        "description": "Bottle hero video",
                        "subject": "subjects/subject-bottle.png",
                        "brief": "Premium water bottle launch",
                        "seconds": 4
                    }
                ],
                "remix": [
                    {
                        "id": "bottle-bw",
                        "description": "B&W remix of the bottle video",
                        "subject": "subjects/subject-bottle.png",
                        "brief": "Premium water bottle launch",
                        "seconds": 4,
                        "remixPrompt": "Convert the entire video to black and white"
                    }
                ]
            }"#,
        )
        .unwrap();

        let cases = load_test_cases(dir.path()).unwrap();
        assert_eq!(cases.image_blending.len(), 1);
        assert_eq!(cases.video_identity[0].seconds, 4);
        assert!(cases.remix[0].remix_prompt.contains("black and white"));
    }

    #[test]
    fn test_read_image_infers_mime_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.png"), b"png bytes").unwrap();
        std::fs::write(dir.path().join("photo.jpg"), b"jpeg bytes").unwrap();

        let png = read_image(dir.path(), "photo.png").unwrap();
        assert_eq!(png.mime, "image/png");
        assert_eq!(png.name, "photo.png");

        let jpeg = read_image(dir.path(), "photo.jpg").unwrap();
        assert_eq!(jpeg.mime, "image/jpeg");
    }

    #[test]
    fn test_generate_placeholders_writes_decodable_pngs() {
        let dir = tempfile::tempdir().unwrap();
        generate_placeholders(dir.path()).unwrap();

        let bytes = std::fs::read(dir.path().join("subjects/subject-bottle.png")).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 512);

        let scene = std::fs::read(dir.path().join("scenes/scene-white.png")).unwrap();
        let decoded = image::load_from_memory(&scene).unwrap();
        assert_eq!(decoded.height(), 1536);
    }
}
