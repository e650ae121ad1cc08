//! Reel Core - Foundation types for the timeline editor
//!
//! This crate provides the value types shared by every other crate:
//! - Millisecond time frames and frame-rate quantization
//! - Element placement and canvas geometry
//! - The common error type

pub mod error;
pub mod geometry;
pub mod time;

pub use error::{ReelError, Result};
pub use geometry::{CanvasBounds, Placement, Rect, Vec2};
pub use time::{FrameRate, Millis, TimeFrame, TimeFramePatch};
