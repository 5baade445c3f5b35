//! Braille Cast - A delta-compressed braille art video encoder and terminal player
//!
//! This crate converts directories of video frames into braille text-art
//! animations, packs them into a seekable/appendable text container with
//! optional embedded audio and subtitles, and plays them back in the
//! terminal at an accurate frame rate.

pub mod audio;
pub mod cli;
pub mod container;
pub mod demuxer;
pub mod differ;
pub mod encoder;
pub mod player;
pub mod prelude;
pub mod render;
pub mod subtitles;

pub use cli::{EncodeCli, PlayCli};
pub use container::ContainerWriter;
pub use demuxer::{Demuxer, FrameBlock, StreamMeta};
pub use differ::{is_refresh_frame, FrameDiffer, RowInstruction};
pub use player::{pace, FrameStats, PlayState, Player};
pub use render::{render, RenderOptions, RenderedFrame};
pub use subtitles::{caption_for_frame, parse_subtitles, Subtitle};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

/// Header line prefix carrying stream metadata
pub const META_PREFIX: &str = "#meta";

/// Marker line introducing the embedded audio block
pub const AUDIO_MARKER: &str = "#audio";

/// Sentinel line terminating one frame's row instructions
pub const FRAME_TERMINATOR: &str = "#next";

/// Maximum number of rows tracked per frame
pub const MAX_ROWS: usize = 1024;

/// Fallback frame rate when the stream metadata carries none
pub const DEFAULT_FPS: u32 = 24;

/// Seconds between forced full-refresh frames
pub const REFRESH_INTERVAL_SECS: u32 = 2;

/// Error types used throughout the application
#[derive(thiserror::Error, Debug)]
pub enum BrailleCastError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed stream: {0}")]
    Format(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, BrailleCastError>;

/// Utility functions
pub mod utils {
    /// Format duration in a human-readable way
    pub fn format_duration(seconds: f64) -> String {
        let total_seconds = seconds as u64;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{}:{:02}", minutes, secs)
        }
    }

    /// Percentage of `part` in `whole`, safe against a zero denominator
    pub fn percent(part: f64, whole: f64) -> f64 {
        if whole > 0.0 {
            part / whole * 100.0
        } else {
            0.0
        }
    }
}
