use crate::{BrailleCastError, Result, AUDIO_MARKER, DEFAULT_FPS, FRAME_TERMINATOR, META_PREFIX};
use log::{debug, info};
use serde::Serialize;
use std::io::{BufRead, Read};

/// Stream metadata parsed from the `#meta` header line
#[derive(Debug, Clone, Serialize)]
pub struct StreamMeta {
    /// Total frame count as declared by the encoder
    pub frames: u64,
    /// Target playback rate
    pub fps: u32,
}

impl StreamMeta {
    /// Parse the header line. Unknown keys are ignored so newer
    /// encoders can add fields without breaking old players.
    pub fn parse(line: &str) -> Result<Self> {
        let rest = line
            .strip_prefix(META_PREFIX)
            .and_then(|r| r.strip_prefix(' '))
            .ok_or_else(|| {
                BrailleCastError::Format(format!("expected {} header, got {:?}", META_PREFIX, line))
            })?;

        let mut meta = Self {
            frames: 0,
            fps: DEFAULT_FPS,
        };

        for pair in rest.trim_end().split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "frames" => {
                    meta.frames = value.parse().map_err(|_| {
                        BrailleCastError::Format(format!("bad frame count {:?}", value))
                    })?;
                }
                "fps" => {
                    meta.fps = value
                        .parse()
                        .map_err(|_| BrailleCastError::Format(format!("bad fps {:?}", value)))?;
                }
                _ => debug!("Ignoring unknown meta key {:?}", key),
            }
        }

        Ok(meta)
    }

    /// Declared stream length in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.fps == 0 {
            0.0
        } else {
            self.frames as f64 / f64::from(self.fps)
        }
    }
}

/// One frame's worth of raw text, everything between two terminators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBlock {
    /// Row instructions plus the caption line, newline-terminated,
    /// forwarded unparsed (the wire escapes are terminal-native)
    pub text: String,
    /// Number of lines in the block
    pub lines: usize,
}

/// Parses the container header, extracts the embedded audio block and
/// yields frames as raw text blocks.
///
/// Transport-agnostic: works over any `BufRead` (file or stdin), so the
/// stream is consumed strictly sequentially and cannot be restarted.
#[derive(Debug)]
pub struct Demuxer<R> {
    reader: R,
    meta: StreamMeta,
    audio: Option<Vec<u8>>,
    pending: Option<Vec<u8>>,
}

impl<R: BufRead> Demuxer<R> {
    /// Read the header and, if present, the audio block.
    ///
    /// The audio lookahead is non-destructive: when the line after the
    /// header is not the audio marker it is kept back and replayed as
    /// the first content line of frame 0.
    pub fn open(mut reader: R) -> Result<Self> {
        let header = read_line(&mut reader)?
            .ok_or_else(|| BrailleCastError::Format("empty stream".to_string()))?;
        let meta = StreamMeta::parse(&line_to_text(&header)?)?;
        info!("Stream metadata: {} frames at {} fps", meta.frames, meta.fps);

        let mut audio = None;
        let mut pending = None;
        if let Some(line) = read_line(&mut reader)? {
            if line_to_text(&line)? == AUDIO_MARKER {
                audio = Some(read_audio_block(&mut reader)?);
            } else {
                pending = Some(line);
            }
        }

        Ok(Self {
            reader,
            meta,
            audio,
            pending,
        })
    }

    /// Parsed stream metadata
    pub fn meta(&self) -> &StreamMeta {
        &self.meta
    }

    /// Take the embedded audio bytes, if the stream carried any
    pub fn take_audio(&mut self) -> Option<Vec<u8>> {
        self.audio.take()
    }

    /// Consume the demuxer, yielding the frame block iterator
    pub fn into_frames(self) -> FrameBlocks<R> {
        FrameBlocks {
            reader: self.reader,
            pending: self.pending,
        }
    }
}

/// Lazy, finite, non-restartable sequence of raw frame blocks
pub struct FrameBlocks<R> {
    reader: R,
    pending: Option<Vec<u8>>,
}

impl<R: BufRead> Iterator for FrameBlocks<R> {
    type Item = Result<FrameBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut text = String::new();
        let mut lines = 0;

        loop {
            let raw = match self.pending.take() {
                Some(raw) => Some(raw),
                None => match read_line(&mut self.reader) {
                    Ok(raw) => raw,
                    Err(e) => return Some(Err(e)),
                },
            };

            let Some(raw) = raw else {
                // EOF before a terminator: drop the partial block
                return None;
            };

            let line = match line_to_text(&raw) {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };

            if line == FRAME_TERMINATOR {
                return Some(Ok(FrameBlock { text, lines }));
            }

            text.push_str(&line);
            text.push('\n');
            lines += 1;
        }
    }
}

/// Read one newline-delimited line as raw bytes, without the newline.
/// Returns `None` at end of input.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(Some(buf))
}

fn line_to_text(raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec())
        .map_err(|_| BrailleCastError::Format("invalid UTF-8 in stream".to_string()))
}

/// Read the decimal byte count line and exactly that many raw bytes.
/// This is a binary-safe read, deliberately ignoring line boundaries.
fn read_audio_block<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let count_line = read_line(reader)?
        .ok_or_else(|| BrailleCastError::Format("truncated audio length".to_string()))?;
    let count: usize = line_to_text(&count_line)?
        .trim()
        .parse()
        .map_err(|_| BrailleCastError::Format("bad audio length".to_string()))?;

    let mut bytes = vec![0u8; count];
    reader.read_exact(&mut bytes).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            BrailleCastError::Format(format!("audio block truncated before {} bytes", count))
        } else {
            BrailleCastError::Io(e)
        }
    })?;
    info!("Extracted {} bytes of embedded audio", count);

    Ok(bytes)
}
