//! One-time creation of the eval configurations.

use log::info;
use serde_json::{Value, json};

use crate::clients::openai::OpenAiClient;
use crate::errors::AppResult;
use crate::evals::ids::{EvalIdStore, EvalIds};

/// Create any evals that do not exist yet and persist their ids. Safe to run
/// repeatedly.
pub async fn create_evals(client: &OpenAiClient, store: &EvalIdStore) -> AppResult<EvalIds> {
    let mut ids = store.load();

    match &ids.image_quality {
        Some(id) => info!("Image Quality eval already exists: {}", id),
        None => {
            info!("Creating Image Quality eval...");
            let id = client.create_eval(image_quality_eval()).await?;
            info!("Created: {}", id);
            ids.image_quality = Some(id);
        }
    }

    match &ids.video_identity {
        Some(id) => info!("Video Identity eval already exists: {}", id),
        None => {
            info!("Creating Video Identity eval...");
            let id = client.create_eval(video_identity_eval()).await?;
            info!("Created: {}", id);
            ids.video_identity = Some(id);
        }
    }

    match &ids.remix_bw {
        Some(id) => info!("Remix B&W eval already exists: {}", id),
        None => {
            info!("Creating Remix B&W eval...");
            let id = client.create_eval(remix_bw_eval()).await?;
            info!("Created: {}", id);
            ids.remix_bw = Some(id);
        }
    }

    store.save(&ids)?;
    Ok(ids)
}

/// Grades blended images for subject preservation, scene integration and
/// overall quality.
fn image_quality_eval() -> Value {
    json!({
        "name": "Campaign Studio - Image Quality",
        "data_source_config": {
            "type": "custom",
            "item_schema": {
                "type": "object",
                "properties": {
                    "subject_image_url": { "type": "string", "description": "URL of the subject/product image" },
                    "scene_image_url": { "type": "string", "description": "URL of the scene/background image" },
                    "prompt": { "type": "string", "description": "User prompt for the image blend" },
                    "generated_image_url": { "type": "string", "description": "URL of the generated blended image" }
                },
                "required": ["subject_image_url", "scene_image_url", "prompt", "generated_image_url"]
            },
            "include_sample_schema": false
        },
        "testing_criteria": [
            {
                "type": "label_model",
                "name": "Image Quality Grader",
                "model": "gpt-4o",
                "input": [
                    {
                        "role": "developer",
                        "content": "You are an expert evaluator for marketing creative images. You will be shown:\n1. A subject/product image (the item to be composited)\n2. A scene/background image\n3. The final blended result\n4. The prompt used for the blend\n\nEvaluate the final image and assign one of these labels:\n- \"excellent\": Subject is perfectly preserved, naturally integrated into scene, professional quality\n- \"good\": Subject mostly preserved, decent integration, minor issues\n- \"acceptable\": Subject recognizable, some integration issues, usable for drafts\n- \"poor\": Significant quality issues, subject distorted or poorly integrated\n- \"failed\": Subject unrecognizable or major generation failures\n\nConsider:\n- Subject identity preservation (is the product/item recognizable and accurate?)\n- Scene integration (does the subject look natural in the scene?)\n- Overall visual quality (lighting, shadows, composition)"
                    },
                    {
                        "role": "user",
                        "content": [
                            { "type": "input_text", "text": "Prompt: {{ item.prompt }}\n\nSubject image:" },
                            { "type": "input_image", "image_url": "{{ item.subject_image_url }}" },
                            { "type": "input_text", "text": "\n\nScene image:" },
                            { "type": "input_image", "image_url": "{{ item.scene_image_url }}" },
                            { "type": "input_text", "text": "\n\nGenerated result:" },
                            { "type": "input_image", "image_url": "{{ item.generated_image_url }}" }
                        ]
                    }
                ],
                "labels": ["excellent", "good", "acceptable", "poor", "failed"],
                "passing_labels": ["excellent", "good", "acceptable"]
            }
        ],
        "metadata": {
            "description": "Evaluates image blending quality for Campaign Studio"
        }
    })
}

/// Grades whether the subject keeps its identity across sampled video frames.
fn video_identity_eval() -> Value {
    json!({
        "name": "Campaign Studio - Video Identity",
        "data_source_config": {
            "type": "custom",
            "item_schema": {
                "type": "object",
                "properties": {
                    "reference_image_url": { "type": "string", "description": "URL of the reference product image" },
                    "frame_urls": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "URLs of extracted video frames (8 frames)"
                    },
                    "script": { "type": "string", "description": "The script/prompt used for video generation" }
                },
                "required": ["reference_image_url", "frame_urls", "script"]
            },
            "include_sample_schema": false
        },
        "testing_criteria": [
            {
                "type": "label_model",
                "name": "Video Identity Grader",
                "model": "gpt-4o",
                "input": [
                    {
                        "role": "developer",
                        "content": "You are an expert evaluator for AI-generated marketing videos. You will be shown:\n1. A reference product image (what the subject should look like)\n2. 8 frames extracted from the generated video\n\nEvaluate if the subject/product maintains its identity throughout the video and assign one of these labels:\n- \"excellent\": Subject perfectly preserved in all frames, instantly recognizable as the same product\n- \"good\": Subject mostly consistent, minor variations but clearly the same item\n- \"acceptable\": Subject recognizable but some frames show notable differences\n- \"poor\": Subject identity inconsistent, hard to tell it's the same product\n- \"failed\": Subject unrecognizable or completely different from reference\n\nFocus on:\n- Is the product/subject consistent across all frames?\n- Does it match the reference image in key visual features?\n- Are there any major morphing or identity drift issues?"
                    },
                    {
                        "role": "user",
                        "content": [
                            { "type": "input_text", "text": "Script: {{ item.script }}\n\nReference product image:" },
                            { "type": "input_image", "image_url": "{{ item.reference_image_url }}" },
                            { "type": "input_text", "text": "\n\nVideo frames (in order):" },
                            { "type": "input_image", "image_url": "{{ item.frame_urls[0] }}" },
                            { "type": "input_image", "image_url": "{{ item.frame_urls[1] }}" },
                            { "type": "input_image", "image_url": "{{ item.frame_urls[2] }}" },
                            { "type": "input_image", "image_url": "{{ item.frame_urls[3] }}" },
                            { "type": "input_image", "image_url": "{{ item.frame_urls[4] }}" },
                            { "type": "input_image", "image_url": "{{ item.frame_urls[5] }}" },
                            { "type": "input_image", "image_url": "{{ item.frame_urls[6] }}" },
                            { "type": "input_image", "image_url": "{{ item.frame_urls[7] }}" }
                        ]
                    }
                ],
                "labels": ["excellent", "good", "acceptable", "poor", "failed"],
                "passing_labels": ["excellent", "good", "acceptable"]
            }
        ],
        "metadata": {
            "description": "Evaluates subject identity preservation in generated videos"
        }
    })
}

/// Verifies that a black-and-white remix actually removed the color.
fn remix_bw_eval() -> Value {
    json!({
        "name": "Campaign Studio - Remix B&W Verification",
        "data_source_config": {
            "type": "custom",
            "item_schema": {
                "type": "object",
                "properties": {
                    "frame_url": { "type": "string", "description": "URL of a frame from the remixed video" },
                    "remix_prompt": { "type": "string", "description": "The remix prompt (should be B&W conversion)" }
                },
                "required": ["frame_url", "remix_prompt"]
            },
            "include_sample_schema": false
        },
        "testing_criteria": [
            {
                "type": "label_model",
                "name": "Remix B&W Verifier",
                "model": "gpt-4o-mini",
                "input": [
                    {
                        "role": "developer",
                        "content": "You are verifying if a video frame has been converted to black and white.\n\nThe remix prompt requested: \"{{ item.remix_prompt }}\"\n\nLook at the provided video frame and determine if it is in black and white (grayscale).\n\nAssign one of these labels:\n- \"pass\": The image is clearly in black and white / grayscale\n- \"fail\": The image still has color or the effect was not applied"
                    },
                    {
                        "role": "user",
                        "content": [
                            { "type": "input_text", "text": "Video frame:" },
                            { "type": "input_image", "image_url": "{{ item.frame_url }}" }
                        ]
                    }
                ],
                "labels": ["pass", "fail"],
                "passing_labels": ["pass"]
            }
        ],
        "metadata": {
            "description": "Verifies B&W remix effect was correctly applied"
        }
    })
}
