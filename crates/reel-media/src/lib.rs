//! Reel Media - FFmpeg integration for imported media
//!
//! This crate handles:
//! - Media file probing (duration, intrinsic size, byte size)
//! - Stream-copy trimming of source files
//! - Encoding rendered canvas frames with mixed audio to MP4/WebM

pub mod export;
pub mod probe;
pub mod trim;

pub use export::{
    AudioInput, Container, ExportCancel, ExportJob, ExportProgress, FrameSource, SolidFrames,
};
pub use probe::{probe_or_fallback, FfprobeProber, MediaInfo, Prober};
pub use trim::TrimJob;

/// Seconds with millisecond precision, as FFmpeg expects on the command line.
pub(crate) fn ffmpeg_seconds(ms: reel_core::Millis) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}
