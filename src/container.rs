use crate::differ::RowInstruction;
use crate::{BrailleCastError, Result, AUDIO_MARKER, FRAME_TERMINATOR, META_PREFIX};
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes a stream header, an optional embedded audio block and a
/// sequence of encoded frames to an output file.
///
/// Owns no cross-frame state beyond the open handle; the caller drives
/// frame ordering and resume skipping.
pub struct ContainerWriter {
    out: BufWriter<File>,
    resume: bool,
    header_written: bool,
    frames_written: u64,
}

impl ContainerWriter {
    /// Open the output stream.
    ///
    /// In resume mode the file is opened for append and neither header
    /// nor audio block may be written again.
    pub fn create(path: &Path, resume: bool) -> Result<Self> {
        let file = if resume {
            OpenOptions::new().append(true).create(true).open(path)?
        } else {
            File::create(path)?
        };
        debug!(
            "Opened container {} ({})",
            path.display(),
            if resume { "append" } else { "fresh" }
        );

        Ok(Self {
            out: BufWriter::new(file),
            resume,
            header_written: false,
            frames_written: 0,
        })
    }

    /// Write the stream header line. Valid once, fresh streams only.
    pub fn write_header(&mut self, frame_count: u64, fps: u32) -> Result<()> {
        if self.resume {
            return Err(BrailleCastError::Config(
                "header is not rewritten when resuming".to_string(),
            ));
        }
        if self.header_written {
            return Err(BrailleCastError::Config(
                "header already written".to_string(),
            ));
        }

        writeln!(self.out, "{} frames={};fps={}", META_PREFIX, frame_count, fps)?;
        self.header_written = true;
        Ok(())
    }

    /// Embed the audio block: marker line, decimal byte count, raw bytes.
    ///
    /// Only valid immediately after the header on a fresh stream; the
    /// block occupies a fixed position before frame 0.
    pub fn write_audio(&mut self, bytes: &[u8]) -> Result<()> {
        if self.resume {
            return Err(BrailleCastError::Config(
                "audio is not rewritten when resuming".to_string(),
            ));
        }
        if !self.header_written || self.frames_written > 0 {
            return Err(BrailleCastError::Config(
                "audio block must directly follow the header".to_string(),
            ));
        }

        writeln!(self.out, "{}", AUDIO_MARKER)?;
        writeln!(self.out, "{}", bytes.len())?;
        self.out.write_all(bytes)?;
        info!("Embedded {} bytes of audio", bytes.len());
        Ok(())
    }

    /// Append one frame: one wire line per row instruction, the caption
    /// line verbatim, then the frame terminator.
    pub fn write_frame(&mut self, instructions: &[RowInstruction], caption: &str) -> Result<()> {
        for instruction in instructions {
            writeln!(self.out, "{}", instruction.to_wire())?;
        }
        writeln!(self.out, "{}", caption)?;
        writeln!(self.out, "{}", FRAME_TERMINATOR)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Number of frames appended through this handle
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush all buffered bytes to disk
    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for ContainerWriter {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}
