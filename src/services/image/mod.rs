//! Image generation services.

pub mod blend;
pub mod edit;
pub mod validate;

/// Output settings shared by all `/images/edits` calls.
pub const IMAGE_SIZE: &str = "1024x1536";
pub const IMAGE_FIDELITY: &str = "high";
pub const IMAGE_OUTPUT_FORMAT: &str = "png";
