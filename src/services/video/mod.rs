//! Video generation and remixing services.

pub mod generate;
pub mod remix;

/// Portrait output, matches the aspect ratio of blended images.
pub const VIDEO_SIZE: &str = "720x1280";
pub const VIDEO_WIDTH: u32 = 720;
pub const VIDEO_HEIGHT: u32 = 1280;
