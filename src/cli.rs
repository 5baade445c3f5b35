use crate::render::RenderOptions;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Encoder command line: renders a directory of frames to a braille
/// stream container.
#[derive(Parser, Debug)]
#[command(name = "braille-enc", author, version, about = "Encode image frames into a braille stream", long_about = None)]
#[command(group(ArgGroup::new("sizing").required(true).args(["size_percent", "max_x"])))]
pub struct EncodeCli {
    /// Directory of input images, consumed in sorted filename order
    #[arg(long, value_name = "DIR")]
    pub input: PathBuf,

    /// Output stream path
    #[arg(long, default_value = "output")]
    pub output: PathBuf,

    /// Reverse the result (swap lit and unlit dots)
    #[arg(long)]
    pub reverse: bool,

    /// Resize images to this percentage of their size
    #[arg(long, value_name = "PERCENT")]
    pub size_percent: Option<f64>,

    /// Maximum output width in braille columns
    #[arg(long, value_name = "SIZE")]
    pub max_x: Option<u32>,

    /// Maximum output height in braille rows
    #[arg(long, value_name = "SIZE")]
    pub max_y: Option<u32>,

    /// Sensitivity for the red channel
    #[arg(long, default_value_t = 2.0, value_name = "RED")]
    pub sensitivity_r: f64,

    /// Sensitivity for the green channel
    #[arg(long, default_value_t = 2.0, value_name = "GREEN")]
    pub sensitivity_g: f64,

    /// Sensitivity for the blue channel
    #[arg(long, default_value_t = 2.0, value_name = "BLUE")]
    pub sensitivity_b: f64,

    /// Sensitivity for the alpha channel
    #[arg(long, default_value_t = 1.0, value_name = "ALPHA")]
    pub sensitivity_a: f64,

    /// Disable padding the output to the minimum canvas
    #[arg(long)]
    pub disable_padding: bool,

    /// Minimum canvas width in pixels when padding is enabled
    #[arg(long, default_value_t = 60, value_name = "SIZE")]
    pub pad_x: u32,

    /// Minimum canvas height in pixels when padding is enabled
    #[arg(long, default_value_t = 60, value_name = "SIZE")]
    pub pad_y: u32,

    /// Disable all image processing (no scaling)
    #[arg(long)]
    pub disable_processing: bool,

    /// Apply an edge detection filter before rendering
    #[arg(long)]
    pub sobel: bool,

    /// Target playback frame rate written to the stream header
    #[arg(long, short, default_value_t = crate::DEFAULT_FPS)]
    pub fps: u32,

    /// Append to the output, starting at this frame index
    #[arg(long, short, default_value_t = 0, value_name = "FRAME")]
    pub resume_from: u64,

    /// Audio file to embed (fresh streams only)
    #[arg(long, value_name = "PATH")]
    pub audio: Option<PathBuf>,

    /// Subtitle file providing frame captions
    #[arg(long, value_name = "PATH")]
    pub subtitles: Option<PathBuf>,

    /// Write every row as a full literal (disable delta compression)
    #[arg(long)]
    pub no_compress: bool,

    /// Stop after this frame index
    #[arg(long, value_name = "FRAME")]
    pub until_frame: Option<u64>,

    /// Prefix prepended to progress log lines
    #[arg(long, value_name = "PREFIX")]
    pub log_prefix: Option<String>,
}

impl EncodeCli {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<(), String> {
        if !self.input.is_dir() {
            return Err(format!(
                "Input directory does not exist: {}",
                self.input.display()
            ));
        }

        if self.fps == 0 {
            return Err("FPS must be greater than 0".to_string());
        }

        if let Some(percent) = self.size_percent {
            if percent <= 0.0 {
                return Err("Size percentage must be greater than 0".to_string());
            }
        }

        if let Some(max_x) = self.max_x {
            if max_x == 0 {
                return Err("Maximum width must be greater than 0".to_string());
            }
        }

        if let Some(ref audio) = self.audio {
            if !audio.is_file() {
                return Err(format!("Audio file does not exist: {}", audio.display()));
            }
            if self.resume_from > 0 {
                return Err("Audio cannot be embedded when resuming".to_string());
            }
        }

        if let Some(ref subtitles) = self.subtitles {
            if !subtitles.is_file() {
                return Err(format!(
                    "Subtitle file does not exist: {}",
                    subtitles.display()
                ));
            }
        }

        if let Some(until) = self.until_frame {
            if until < self.resume_from {
                return Err("Stop frame must not precede the resume frame".to_string());
            }
        }

        Ok(())
    }

    /// Renderer options derived from the flags
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            reverse: self.reverse,
            size_percent: self.size_percent,
            max_x: self.max_x,
            max_y: self.max_y,
            sensitivity: (
                self.sensitivity_r,
                self.sensitivity_g,
                self.sensitivity_b,
                self.sensitivity_a,
            ),
            enable_padding: !self.disable_padding,
            pad_size: (self.pad_x, self.pad_y),
            enable_processing: !self.disable_processing,
        }
    }

    /// Progress log prefix, with a separating space when configured
    pub fn progress_prefix(&self) -> String {
        match self.log_prefix {
            Some(ref prefix) => format!("{} ", prefix),
            None => String::new(),
        }
    }
}

/// Player command line: plays a braille stream container in the terminal
#[derive(Parser, Debug)]
#[command(name = "braille-play", author, version, about = "Play a braille stream in the terminal", long_about = None)]
pub struct PlayCli {
    /// Input stream path, or - for standard input
    #[arg(long, short, value_name = "PATH")]
    pub input: String,

    /// Override the frame rate from the stream header
    #[arg(long, short)]
    pub fps: Option<f64>,

    /// Discard embedded audio instead of playing it
    #[arg(long)]
    pub no_audio: bool,

    /// Initial offset in seconds added to the first frame's wait
    #[arg(long, short, default_value_t = 0.0, value_name = "SECONDS")]
    pub skip: f64,

    /// Print stream metadata as JSON and exit
    #[arg(long)]
    pub info: bool,
}

impl PlayCli {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.input == "-" {
            if atty::is(atty::Stream::Stdin) {
                return Err("Refusing to read the stream from an interactive terminal".to_string());
            }
        } else if !PathBuf::from(&self.input).is_file() {
            return Err(format!("Input stream does not exist: {}", self.input));
        }

        if let Some(fps) = self.fps {
            if fps <= 0.0 {
                return Err("FPS must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// Whether the stream comes from standard input
    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }
}
