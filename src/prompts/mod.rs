//! Prompt templates for image and video generation.

use crate::timing::parse_segments;

/// Prompt for blending a product image into a scene image. The user's prompt,
/// when present, is appended to the base instructions.
pub fn build_image_prompt(user_prompt: Option<&str>) -> String {
    let base = "Use image 1 as the subject and image 2 as the scene. Place the subject naturally into the scene with realistic lighting, shadow, and perspective. Preserve branding details, textures, and colors on the subject. The output image should have an aspect ratio suitable for viewing on social media apps like Instagram and TikTok.";
    match user_prompt {
        Some(prompt) if !prompt.is_empty() => format!("{} {}", base, prompt),
        _ => base.to_string(),
    }
}

/// Prompt for refining an existing image.
pub fn build_regenerate_prompt(user_prompt: Option<&str>) -> String {
    let base = "Refine and improve this image based on the prompt. Only make the changes specified in the prompt and keep the image as close as possible to the original.";
    match user_prompt {
        Some(prompt) if !prompt.is_empty() => format!("{} {}", base, prompt),
        _ => base.to_string(),
    }
}

/// Prompt for script generation from an ad brief.
pub fn build_script_prompt(brief: &str, seconds: u32) -> String {
    [
        "Write a concise ad video script for a premium marketing spot.".to_string(),
        format!("Total duration: {} seconds.", seconds),
        "Output format: timestamped beats that fully cover the total duration.".to_string(),
        "Each line must be in the form: [MM:SS-MM:SS] Beat description (scene + action + camera)."
            .to_string(),
        "The final timestamp must end exactly at the total duration.".to_string(),
        "Use 3-7 beats depending on duration.".to_string(),
        "Keep it brand-safe, product-forward, and cinematic.".to_string(),
        String::new(),
        format!("Brief: {}", brief),
    ]
    .join("\n")
}

/// Wrap a timestamped script in the full cinematic production prompt sent to
/// the video model. Shot count and total duration are derived from the
/// script's own timing annotations.
pub fn build_video_prompt(script: &str) -> String {
    let cleaned = script.trim();
    let segments = parse_segments(cleaned);
    let shot_count = segments.len();
    let duration_seconds = segments.last().map(|segment| segment.end);

    let format_and_look_line = match duration_seconds {
        Some(duration) => format!(
            "Duration {}s; 180° shutter; digital capture emulating 65 mm photochemical contrast; fine grain; subtle halation on speculars; no gate weave.",
            duration
        ),
        None => "Duration unspecified; 180° shutter; digital capture emulating 65 mm photochemical contrast; fine grain; subtle halation on speculars; no gate weave.".to_string(),
    };
    let shot_list_header = match (shot_count, duration_seconds) {
        (0, _) => "Optimized Shot List (shots and duration unspecified)".to_string(),
        (count, Some(duration)) => {
            format!("Optimized Shot List ({} shots / {} s total)", count, duration)
        }
        (count, None) => format!("Optimized Shot List ({} shots / duration unspecified)", count),
    };

    [
        "Format & Look",
        &format_and_look_line,
        "",
        "Lenses & Filtration",
        "32 mm / 50 mm spherical primes; Black Pro-Mist 1/4; slight CPL rotation to manage glass reflections on train windows.",
        "",
        "Grade / Palette",
        "Highlights: clean morning sunlight with amber lift.",
        "Mids: balanced neutrals with slight teal cast in shadows.",
        "Blacks: soft, neutral with mild lift for haze retention.",
        "",
        "Lighting & Atmosphere",
        "Natural sunlight from camera left, low angle (07:30 AM).",
        "Bounce: 4×4 ultrabounce silver from trackside.",
        "Negative fill from opposite wall.",
        "Practical: sodium platform lights on dim fade.",
        "Atmos: gentle mist; train exhaust drift through light beam.",
        "",
        "Location & Framing",
        "Urban commuter platform, dawn.",
        "Foreground: yellow safety line, coffee cup on bench.",
        "Midground: waiting passengers silhouetted in haze.",
        "Background: arriving train braking to a stop.",
        "Avoid signage or corporate branding.",
        "",
        "Wardrobe / Props / Extras",
        "Main subject: mid-30s traveler, navy coat, backpack slung on one shoulder, holding phone loosely at side.",
        "Extras: commuters in muted tones; one cyclist pushing bike.",
        "Props: paper coffee cup, rolling luggage, LED departure board (generic destinations).",
        "",
        "Sound",
        "Diegetic only: faint rail screech, train brakes hiss, distant announcement muffled (-20 LUFS), low ambient hum.",
        "Footsteps and paper rustle; no score or added foley.",
        "",
        &shot_list_header,
        cleaned,
        "",
        "Camera Notes (Why It Reads)",
        "Keep eyeline low and close to lens axis for intimacy.",
        "Allow micro flares from train glass as aesthetic texture.",
        "Preserve subtle handheld imperfection for realism.",
        "Do not break silhouette clarity with overexposed flare; retain skin highlight roll-off.",
        "",
        "Finishing",
        "Fine-grain overlay with mild chroma noise for realism; restrained halation on practicals; warm-cool LUT for morning split tone.",
        "Mix: prioritize train and ambient detail over footstep transients.",
        "Poster frame: traveler mid-turn, golden rim light, arriving train soft-focus in background haze.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_prompt_appends_user_text() {
        let base = build_image_prompt(None);
        assert!(base.starts_with("Use image 1 as the subject"));
        let custom = build_image_prompt(Some("Make it rainy."));
        assert!(custom.starts_with(&base));
        assert!(custom.ends_with("Make it rainy."));
    }

    #[test]
    fn test_regenerate_prompt_without_user_text() {
        let prompt = build_regenerate_prompt(None);
        assert!(prompt.contains("keep the image as close as possible to the original"));
    }

    #[test]
    fn test_script_prompt_mentions_duration_and_brief() {
        let prompt = build_script_prompt("Launch a new espresso machine", 8);
        assert!(prompt.contains("Total duration: 8 seconds."));
        assert!(prompt.contains("[MM:SS-MM:SS]"));
        assert!(prompt.ends_with("Brief: Launch a new espresso machine"));
    }

    #[test]
    fn test_video_prompt_derives_shot_count_and_duration() {
        let script = "[00:00-00:04] Product hero shot [00:04-00:08] Logo reveal";
        let prompt = build_video_prompt(script);
        assert!(prompt.contains("Duration 8s;"));
        assert!(prompt.contains("Optimized Shot List (2 shots / 8 s total)"));
        assert!(prompt.contains(script));
    }

    #[test]
    fn test_video_prompt_without_timestamps() {
        let prompt = build_video_prompt("A dreamy product montage");
        assert!(prompt.contains("Duration unspecified;"));
        assert!(prompt.contains("Optimized Shot List (shots and duration unspecified)"));
    }
}
