use crate::demuxer::{FrameBlock, StreamMeta};
use crate::utils::format_duration;
use crate::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use log::{debug, info};
use std::io::Write;
use std::time::Instant;
use tokio::time::{sleep, Duration};

/// Number of recent frames the rolling statistics cover
pub const STATS_WINDOW: usize = 20;

/// Playback loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// Before the first frame has been drawn
    Priming,
    /// Steady playback loop
    Playing,
    /// Frame source exhausted
    Finished,
    /// Stopped externally at a frame boundary
    Aborted,
}

/// Pure pacing step: sleep time for this cycle and the carry term for
/// the next one.
///
/// `remaining` is the signed debt/credit from the previous cycle. A
/// draw that overruns the period produces a negative carry, so the
/// scheduler catches up by shortening future waits instead of dropping
/// frames.
pub fn pace(period_secs: f64, draw_secs: f64, remaining: f64) -> (f64, f64) {
    let sleep_time = period_secs - draw_secs + remaining;
    if sleep_time > 0.0 {
        (sleep_time, 0.0)
    } else {
        (0.0, sleep_time)
    }
}

/// Rolling per-frame statistics over a fixed window of draw durations
#[derive(Debug)]
pub struct FrameStats {
    durations: [f64; STATS_WINDOW],
    frames: u64,
    total_lines: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self {
            durations: [0.0; STATS_WINDOW],
            frames: 0,
            total_lines: 0,
        }
    }

    /// Record one frame's draw duration and line count
    pub fn record(&mut self, draw_secs: f64, lines: usize) {
        self.durations[(self.frames % STATS_WINDOW as u64) as usize] = draw_secs;
        self.frames += 1;
        self.total_lines += lines as u64;
    }

    /// Total frames recorded
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Rate implied by the most recent draw duration
    pub fn instantaneous_fps(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        let last = self.durations[((self.frames - 1) % STATS_WINDOW as u64) as usize];
        if last > 0.0 {
            1.0 / last
        } else {
            0.0
        }
    }

    /// Average rate over the window of recent draw durations
    pub fn windowed_fps(&self) -> f64 {
        let filled = (self.frames as usize).min(STATS_WINDOW);
        if filled == 0 {
            return 0.0;
        }
        let sum: f64 = self.durations[..filled].iter().sum();
        if sum > 0.0 {
            filled as f64 / sum
        } else {
            0.0
        }
    }

    /// Throughput in stream lines per second of wall time
    pub fn lines_per_second(&self, elapsed_secs: f64) -> f64 {
        if elapsed_secs > 0.0 {
            self.total_lines as f64 / elapsed_secs
        } else {
            0.0
        }
    }
}

/// Consumes frame blocks at a target rate and keeps wall-clock pacing
/// accurate with the carried remainder term.
pub struct Player<W: Write> {
    out: W,
    fps: f64,
    skip: f64,
    state: PlayState,
    stats: FrameStats,
}

impl<W: Write> Player<W> {
    /// Create a player writing to `out`.
    ///
    /// `skip` seeds the carry term: a positive value delays video by
    /// that many seconds so late-joining audio can line up.
    pub fn new(out: W, fps: f64, skip: f64) -> Self {
        Self {
            out,
            fps,
            skip,
            state: PlayState::Priming,
            stats: FrameStats::new(),
        }
    }

    /// Current loop state
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Statistics recorded so far
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Play all frames from the source.
    ///
    /// Each cycle writes the block verbatim (the wire escapes reproduce
    /// the frame through terminal cursor semantics), then suspends for
    /// the paced remainder of the frame period. The only await points
    /// are the timed sleep and the ctrl-c watch, so nothing blocks the
    /// timing path once a block is read.
    pub async fn run<I>(&mut self, frames: I, meta: &StreamMeta) -> Result<PlayState>
    where
        I: Iterator<Item = Result<FrameBlock>>,
    {
        let period = 1.0 / self.fps;
        let duration = format_duration(meta.duration_secs());
        let mut remaining = self.skip;

        queue!(self.out, Clear(ClearType::All), MoveTo(0, 1))?;
        self.out.flush()?;

        let start = Instant::now();
        let mut cycle_start = Instant::now();

        for block in frames {
            let block = block?;
            self.state = PlayState::Playing;

            // Raw passthrough: row instructions are terminal-native
            self.out.write_all(block.text.as_bytes())?;
            self.out.flush()?;

            let draw = cycle_start.elapsed().as_secs_f64();
            let (sleep_secs, carry) = pace(period, draw, remaining);
            remaining = carry;

            if sleep_secs > 0.0 {
                tokio::select! {
                    _ = sleep(Duration::from_secs_f64(sleep_secs)) => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, stopping at frame boundary");
                        self.state = PlayState::Aborted;
                        break;
                    }
                }
            } else {
                debug!("Frame overran its period, carrying {:.4}s debt", carry);
            }

            self.stats.record(draw, block.lines);
            let status = self.status_line(start.elapsed().as_secs_f64(), &duration, remaining);
            queue!(
                self.out,
                MoveTo(0, 0),
                Clear(ClearType::CurrentLine),
                Print(&status),
                MoveTo(0, 1)
            )?;
            self.out.flush()?;

            cycle_start = Instant::now();
        }

        if self.state != PlayState::Aborted {
            self.state = PlayState::Finished;
        }
        info!(
            "Playback {:?} after {} frames",
            self.state,
            self.stats.frames()
        );
        Ok(self.state)
    }

    fn status_line(&self, elapsed: f64, duration: &str, remaining: f64) -> String {
        format!(
            "{:.2}s / {}, {:.2} lps, {:.2} fps, {:.2} avg fps over last {} frames, carry {:+.3}s",
            elapsed,
            duration,
            self.stats.lines_per_second(elapsed),
            self.stats.instantaneous_fps(),
            self.stats.windowed_fps(),
            STATS_WINDOW,
            remaining,
        )
    }
}
