use crate::{BrailleCastError, Result};
use log::{debug, info};
use std::io::Write;
use std::process::{Child, Command, Stdio};

/// Capability handed to the player for audio output.
///
/// The scheduler never depends on the concrete sink; audio is fed once
/// at stream start and is not resynchronized per frame.
pub trait AudioSink {
    /// Push raw audio bytes into the sink
    fn feed(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Sink that discards everything, for `--no-audio` and silent streams
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        debug!("Discarding {} audio bytes (null sink)", bytes.len());
        Ok(())
    }
}

/// Sink backed by an external player process fed over a stdin pipe
pub struct ProcessSink {
    child: Child,
}

impl ProcessSink {
    /// Spawn an arbitrary command with a piped stdin as the sink
    pub fn new(program: &str, args: &[&str]) -> Result<Self> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        info!("Spawned audio process {} (pid {})", program, child.id());
        Ok(Self { child })
    }

    /// The external player the original pipeline uses
    pub fn vlc() -> Result<Self> {
        Self::new(
            "vlc",
            &["fd://0", "--no-one-instance", "-I", "dummy", "--no-repeat"],
        )
    }
}

impl AudioSink for ProcessSink {
    fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        let stdin = self
            .child
            .stdin
            .as_mut()
            .ok_or_else(|| BrailleCastError::Config("audio process has no stdin".to_string()))?;
        stdin.write_all(bytes)?;
        stdin.flush()?;
        debug!("Fed {} audio bytes to the audio process", bytes.len());
        Ok(())
    }
}

impl Drop for ProcessSink {
    fn drop(&mut self) {
        // The player owns playback lifetime; stop the process with it
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_accepts_bytes() {
        let mut sink = NullSink;
        assert!(sink.feed(&[1, 2, 3]).is_ok());
        assert!(sink.feed(&[]).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_sink_feeds_stdin() {
        let mut sink = ProcessSink::new("cat", &[]).unwrap();
        assert!(sink.feed(b"pcm bytes").is_ok());
    }

    #[test]
    fn test_missing_program_is_an_error() {
        assert!(ProcessSink::new("definitely-not-a-real-player", &[]).is_err());
    }
}
