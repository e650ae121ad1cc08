//! Time representation for frame-accurate editing
//!
//! Element intervals are whole milliseconds. The playhead is quantized to
//! frames, and frame times are computed with rational arithmetic so that
//! repeated conversions never drift.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds on the timeline. Signed so deltas can be applied before clamping.
pub type Millis = i64;

/// A `[start, end]` interval in milliseconds during which an element is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeFrame {
    pub start: Millis,
    pub end: Millis,
}

impl TimeFrame {
    /// Create a time frame. `end` is raised to `start` if it lies before it.
    #[inline]
    pub fn new(start: Millis, end: Millis) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Length of the interval.
    #[inline]
    pub fn duration(self) -> Millis {
        self.end - self.start
    }

    /// Whether `time` lies inside the interval, both ends inclusive.
    #[inline]
    pub fn contains(self, time: f64) -> bool {
        self.start as f64 <= time && time <= self.end as f64
    }

    /// Whether `time` lies strictly inside the interval.
    #[inline]
    pub fn strictly_contains(self, time: Millis) -> bool {
        self.start < time && time < self.end
    }

    /// Whether `next` starts exactly where this interval ends.
    #[inline]
    pub fn is_followed_by(self, next: Self) -> bool {
        self.end == next.start
    }

    /// Split into `[start, at]` and `[at, end]`. `None` unless `at` is strictly inside.
    pub fn split_at(self, at: Millis) -> Option<(Self, Self)> {
        if !self.strictly_contains(at) {
            return None;
        }
        Some((
            Self {
                start: self.start,
                end: at,
            },
            Self {
                start: at,
                end: self.end,
            },
        ))
    }

    /// Both ends moved by `delta`, unclamped.
    #[inline]
    pub fn shifted(self, delta: Millis) -> TimeFramePatch {
        TimeFramePatch {
            start: Some(self.start + delta),
            end: Some(self.end + delta),
        }
    }

    /// Merge a partial update into this frame, clamping into `[0, max_time]`.
    ///
    /// `start` is clamped to `[0, max_time]` and `end` to `[start, max_time]`.
    pub fn patched(self, patch: TimeFramePatch, max_time: Millis) -> Self {
        let max_time = max_time.max(0);
        let start = patch.start.unwrap_or(self.start).clamp(0, max_time);
        let end = patch.end.unwrap_or(self.end).clamp(start, max_time);
        Self { start, end }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}ms, {}ms]", self.start, self.end)
    }
}

/// A partial time-frame update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeFramePatch {
    pub start: Option<Millis>,
    pub end: Option<Millis>,
}

impl TimeFramePatch {
    /// Patch both ends.
    pub fn both(start: Millis, end: Millis) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Patch only the start.
    pub fn start(start: Millis) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Patch only the end.
    pub fn end(end: Millis) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }
}

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Exact start time of `frame` in milliseconds.
    #[inline]
    pub fn frame_time(self, frame: i64) -> Rational64 {
        Rational64::new(
            frame * 1000 * self.denominator as i64,
            self.numerator as i64,
        )
    }

    /// Start time of `frame` in milliseconds as f64.
    pub fn frame_time_ms(self, frame: i64) -> f64 {
        let t = self.frame_time(frame);
        *t.numer() as f64 / *t.denom() as f64
    }

    /// Index of the frame containing `time_ms` (floor).
    #[inline]
    pub fn frame_at(self, time_ms: Rational64) -> i64 {
        let frames = time_ms
            * Rational64::new(self.numerator as i64, 1000 * self.denominator as i64);
        frames.floor().to_integer()
    }

    /// Index of the frame containing a whole-millisecond time (floor).
    #[inline]
    pub fn frame_at_ms(self, time_ms: Millis) -> i64 {
        self.frame_at(Rational64::from_integer(time_ms))
    }

    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_60
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}
