// Re-export commonly used types for convenience
pub use crate::audio::{AudioSink, NullSink, ProcessSink};
pub use crate::cli::{EncodeCli, PlayCli};
pub use crate::container::ContainerWriter;
pub use crate::demuxer::{Demuxer, FrameBlock, FrameBlocks, StreamMeta};
pub use crate::differ::{is_refresh_frame, FrameDiffer, RowInstruction};
pub use crate::encoder::{encode, EncodeSummary};
pub use crate::player::{pace, FrameStats, PlayState, Player, STATS_WINDOW};
pub use crate::render::{render, sobel, BrailleRenderer, RenderOptions, RenderedFrame};
pub use crate::subtitles::{caption_for_frame, parse_subtitle_text, parse_subtitles, Subtitle};
pub use crate::utils::{format_duration, percent};
pub use crate::{BrailleCastError, Result};
pub use crate::{AUDIO_MARKER, DEFAULT_FPS, FRAME_TERMINATOR, MAX_ROWS, META_PREFIX};
