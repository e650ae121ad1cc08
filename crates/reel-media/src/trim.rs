//! Stream-copy trimming of a source file.

use std::path::PathBuf;

use ffmpeg_sidecar::command::FfmpegCommand;
use reel_core::{Millis, ReelError, Result};
use tracing::info;

use crate::ffmpeg_seconds;

/// Cut `[start_ms, end_ms]` out of `input` into `output` without re-encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimJob {
    pub input: PathBuf,
    pub start_ms: Millis,
    pub end_ms: Millis,
    pub output: PathBuf,
}

impl TrimJob {
    pub fn new(
        input: impl Into<PathBuf>,
        start_ms: Millis,
        end_ms: Millis,
        output: impl Into<PathBuf>,
    ) -> Self {
        let start_ms = start_ms.max(0);
        Self {
            input: input.into(),
            start_ms,
            end_ms: end_ms.max(start_ms),
            output: output.into(),
        }
    }

    /// Length of the cut.
    pub fn duration_ms(&self) -> Millis {
        self.end_ms - self.start_ms
    }

    /// Build the FFmpeg command arguments.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-y".into(),
            "-ss".into(),
            ffmpeg_seconds(self.start_ms),
            "-i".into(),
            self.input.to_string_lossy().into_owned(),
            "-t".into(),
            ffmpeg_seconds(self.duration_ms()),
            "-c".into(),
            "copy".into(),
            self.output.to_string_lossy().into_owned(),
        ]
    }

    /// Run the trim and block until FFmpeg exits.
    pub fn run(&self) -> Result<PathBuf> {
        if self.duration_ms() == 0 {
            return Err(ReelError::InvalidParameter("Empty trim range".into()));
        }
        if !self.input.exists() {
            return Err(ReelError::NotFound(format!(
                "File not found: {}",
                self.input.display()
            )));
        }

        info!(
            input = %self.input.display(),
            start_ms = self.start_ms,
            end_ms = self.end_ms,
            "Trimming media"
        );
        let mut child = FfmpegCommand::new()
            .args(self.ffmpeg_args())
            .spawn()
            .map_err(|e| ReelError::Encoder(format!("Failed to spawn ffmpeg: {e}")))?;
        let status = child
            .wait()
            .map_err(|e| ReelError::Encoder(format!("Failed to wait for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(ReelError::Encoder(format!(
                "ffmpeg exited with status: {}",
                status
            )));
        }
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_args() {
        let job = TrimJob::new("input.mp4", 1500, 4000, "output.mp4");
        assert_eq!(
            job.ffmpeg_args(),
            [
                "-y", "-ss", "1.500", "-i", "input.mp4", "-t", "2.500", "-c", "copy", "output.mp4"
            ]
        );
    }

    #[test]
    fn test_trim_range_normalized() {
        let job = TrimJob::new("in.mp4", -100, -500, "out.mp4");
        assert_eq!(job.start_ms, 0);
        assert_eq!(job.end_ms, 0);
        assert!(matches!(job.run(), Err(ReelError::InvalidParameter(_))));
    }

    #[test]
    fn test_missing_input_is_not_found() {
        let job = TrimJob::new("/no/such/input.mp4", 0, 1000, "out.mp4");
        assert!(matches!(job.run(), Err(ReelError::NotFound(_))));
    }
}
