//! Playhead clock.
//!
//! The playhead is stored as a frame index. While playing, logical time is
//! derived from a wall-clock anchor pair so that frame pacing never
//! accumulates rounding error; reaching the end wraps back to zero.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use num_rational::Rational64;
use reel_core::{FrameRate, Millis};
use tracing::debug;

// ── Wall clocks ─────────────────────────────────────────────────

/// Source of monotonic wall time.
pub trait WallClock {
    /// Time elapsed since some fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven wall clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Move time forward by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

// ── Playback clock ──────────────────────────────────────────────

/// Whether the playhead is advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Stopped,
    Playing {
        /// Wall time at which playback was (re)anchored.
        wall_anchor: Duration,
        /// Logical time in milliseconds at `wall_anchor`.
        logical_anchor: Rational64,
    },
}

/// Frame-quantized playhead.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    frame: i64,
    rate: FrameRate,
    max_time: Millis,
    mode: PlaybackMode,
}

fn duration_ms(d: Duration) -> Rational64 {
    Rational64::new(d.as_nanos() as i64, 1_000_000)
}

impl PlaybackClock {
    pub fn new(rate: FrameRate, max_time: Millis) -> Self {
        Self {
            frame: 0,
            rate,
            max_time: max_time.max(0),
            mode: PlaybackMode::Stopped,
        }
    }

    pub fn frame_index(&self) -> i64 {
        self.frame
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.rate
    }

    pub fn max_time(&self) -> Millis {
        self.max_time
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.mode, PlaybackMode::Playing { .. })
    }

    /// Exact playhead time in milliseconds.
    pub fn current_time(&self) -> Rational64 {
        self.rate.frame_time(self.frame)
    }

    /// Playhead time in milliseconds.
    pub fn current_time_ms(&self) -> f64 {
        self.rate.frame_time_ms(self.frame)
    }

    /// Start advancing from the current frame. No-op while already playing.
    pub fn play(&mut self, now: Duration) {
        if self.is_playing() {
            return;
        }
        self.mode = PlaybackMode::Playing {
            wall_anchor: now,
            logical_anchor: self.current_time(),
        };
        debug!(frame = self.frame, "Playback started");
    }

    /// Freeze the playhead.
    pub fn pause(&mut self) {
        if self.is_playing() {
            self.mode = PlaybackMode::Stopped;
            debug!(frame = self.frame, "Playback paused");
        }
    }

    /// Advance to wall time `now`. Returns whether the frame changed.
    pub fn tick(&mut self, now: Duration) -> bool {
        let PlaybackMode::Playing {
            wall_anchor,
            logical_anchor,
        } = self.mode
        else {
            return false;
        };

        let elapsed = now.saturating_sub(wall_anchor);
        let t = logical_anchor + duration_ms(elapsed);
        let previous = self.frame;

        if t >= Rational64::from_integer(self.max_time) {
            self.frame = 0;
            self.mode = PlaybackMode::Playing {
                wall_anchor: now,
                logical_anchor: Rational64::from_integer(0),
            };
            debug!("Playback wrapped to start");
        } else {
            self.frame = self.rate.frame_at(t);
        }

        self.frame != previous
    }

    /// Stop and jump to `time_ms`. Out-of-range times are ignored.
    pub fn seek(&mut self, time_ms: Millis) -> bool {
        if time_ms < 0 || time_ms > self.max_time {
            return false;
        }
        self.pause();
        self.frame = self.rate.frame_at_ms(time_ms);
        true
    }

    /// Change the upper bound, pulling the playhead back inside it.
    pub fn set_max_time(&mut self, max_time: Millis) {
        self.max_time = max_time.max(0);
        if self.current_time() > Rational64::from_integer(self.max_time) {
            self.frame = self.rate.frame_at_ms(self.max_time);
            if let PlaybackMode::Playing { wall_anchor, .. } = self.mode {
                self.mode = PlaybackMode::Playing {
                    wall_anchor,
                    logical_anchor: self.current_time(),
                };
            }
        }
    }

    /// Change the quantization rate, keeping the playhead time.
    pub fn set_frame_rate(&mut self, rate: FrameRate, now: Duration) {
        let time = self.current_time();
        self.rate = rate;
        self.frame = rate.frame_at(time);
        if self.is_playing() {
            self.mode = PlaybackMode::Playing {
                wall_anchor: now,
                logical_anchor: self.current_time(),
            };
        }
    }
}
