//! Export pipeline for encoding the rendered canvas to a video file.
//!
//! Canvas frames are piped to FFmpeg as raw RGBA; audio elements are read
//! from their sources, delayed to their timeline position and mixed with
//! `amix`. Supports progress reporting and cancellation.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use reel_core::{CanvasBounds, FrameRate, Millis, ReelError, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ffmpeg_seconds;

// ── Containers ──────────────────────────────────────────────────

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mp4,
    Webm,
}

impl Container {
    /// File extension for this container.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }

    /// FFmpeg video encoder.
    pub fn video_encoder(self) -> &'static str {
        match self {
            Self::Mp4 => "libx264",
            Self::Webm => "libvpx-vp9",
        }
    }

    /// FFmpeg audio encoder.
    pub fn audio_encoder(self) -> &'static str {
        match self {
            Self::Mp4 => "aac",
            Self::Webm => "libopus",
        }
    }
}

impl std::str::FromStr for Container {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            other => Err(ReelError::InvalidParameter(format!(
                "Unsupported container: {other}"
            ))),
        }
    }
}

// ── Frame sources ───────────────────────────────────────────────

/// Produces the RGBA pixels of each exported frame.
pub trait FrameSource {
    /// Fill `buf` (width * height * 4 bytes) with frame `index`.
    fn fill(&mut self, index: u64, buf: &mut [u8]);
}

/// Every frame is one solid colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidFrames {
    pub rgba: [u8; 4],
}

impl SolidFrames {
    /// Parse a `#rrggbb` colour.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ReelError::InvalidParameter(format!("Invalid colour: {hex}")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ReelError::InvalidParameter(format!("Invalid colour: {hex}")))
        };
        Ok(Self {
            rgba: [channel(0)?, channel(2)?, channel(4)?, 255],
        })
    }
}

impl FrameSource for SolidFrames {
    fn fill(&mut self, _index: u64, buf: &mut [u8]) {
        for px in buf.chunks_exact_mut(4) {
            px.copy_from_slice(&self.rgba);
        }
    }
}

// ── Export job ───────────────────────────────────────────────────

/// Export progress information.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current frame being written.
    pub current_frame: u64,
    /// Total frames to write.
    pub total_frames: u64,
    /// Estimated time remaining in seconds.
    pub eta_seconds: f64,
    /// Encoding speed in frames per second.
    pub fps: f64,
}

impl ExportProgress {
    /// Completion fraction (0.0 to 1.0).
    pub fn fraction(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.current_frame as f64 / self.total_frames as f64
    }
}

/// An audio source placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInput {
    pub path: PathBuf,
    /// Timeline position where the audio starts playing.
    pub offset_ms: Millis,
}

/// An export job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub output: PathBuf,
    pub container: Container,
    pub canvas: CanvasBounds,
    pub frame_rate: FrameRate,
    pub duration_ms: Millis,
    pub audio_inputs: Vec<AudioInput>,
}

impl ExportJob {
    /// Create a job for `duration_ms` of canvas at 30 fps without audio.
    pub fn new(
        output: impl Into<PathBuf>,
        container: Container,
        canvas: CanvasBounds,
        duration_ms: Millis,
    ) -> Self {
        Self {
            output: output.into(),
            container,
            canvas,
            frame_rate: FrameRate::FPS_30,
            duration_ms: duration_ms.max(0),
            audio_inputs: Vec::new(),
        }
    }

    /// Mix an audio source into the output.
    pub fn with_audio(mut self, path: impl Into<PathBuf>, offset_ms: Millis) -> Self {
        self.audio_inputs.push(AudioInput {
            path: path.into(),
            offset_ms: offset_ms.max(0),
        });
        self
    }

    /// Frame dimensions, rounded to even numbers for yuv420p.
    pub fn frame_size(&self) -> (u32, u32) {
        let even = |v: f32| ((v.max(2.0) as u32) / 2) * 2;
        (even(self.canvas.width), even(self.canvas.height))
    }

    /// Number of frames covering the duration.
    pub fn total_frames(&self) -> u64 {
        let frames = self.frame_rate.frame_at_ms(self.duration_ms);
        let exact = self.frame_rate.frame_time(frames).is_integer()
            && self.frame_rate.frame_time(frames).to_integer() == self.duration_ms;
        (if exact { frames } else { frames + 1 }).max(0) as u64
    }

    /// The `-filter_complex` graph that delays and mixes the audio inputs.
    ///
    /// Audio input `i` is FFmpeg input `i + 1`; input 0 is the piped video.
    pub fn audio_filter(&self) -> Option<String> {
        if self.audio_inputs.is_empty() {
            return None;
        }
        let mut graph = String::new();
        let mut labels = String::new();
        for (i, input) in self.audio_inputs.iter().enumerate() {
            let delay = input.offset_ms;
            graph.push_str(&format!("[{}:a]adelay={delay}|{delay}[a{i}];", i + 1));
            labels.push_str(&format!("[a{i}]"));
        }
        graph.push_str(&format!(
            "{labels}amix=inputs={}:duration=longest[aout]",
            self.audio_inputs.len()
        ));
        Some(graph)
    }

    /// Build the FFmpeg command arguments.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let (width, height) = self.frame_size();
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pixel_format".into(),
            "rgba".into(),
            "-video_size".into(),
            format!("{width}x{height}"),
            "-framerate".into(),
            format!(
                "{}/{}",
                self.frame_rate.numerator, self.frame_rate.denominator
            ),
            "-i".into(),
            "pipe:0".into(),
        ];

        for input in &self.audio_inputs {
            args.push("-i".into());
            args.push(input.path.to_string_lossy().into_owned());
        }

        if let Some(filter) = self.audio_filter() {
            args.extend_from_slice(&[
                "-filter_complex".into(),
                filter,
                "-map".into(),
                "0:v".into(),
                "-map".into(),
                "[aout]".into(),
                "-c:a".into(),
                self.container.audio_encoder().into(),
            ]);
        }

        args.extend_from_slice(&[
            "-c:v".into(),
            self.container.video_encoder().into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-t".into(),
            ffmpeg_seconds(self.duration_ms),
        ]);

        args.push(self.output.to_string_lossy().into_owned());
        args
    }

    /// Run the export, pulling frames from `frames`.
    ///
    /// * `on_progress` – called every 10 frames and on the last frame.
    /// * `cancel` – checked every frame; if cancelled, the export aborts early.
    pub fn run(
        &self,
        frames: &mut dyn FrameSource,
        on_progress: impl Fn(ExportProgress),
        cancel: &ExportCancel,
    ) -> Result<()> {
        let total_frames = self.total_frames();
        if total_frames == 0 {
            return Ok(());
        }
        for input in &self.audio_inputs {
            if !input.path.exists() {
                return Err(ReelError::NotFound(format!(
                    "Audio source not found: {}",
                    input.path.display()
                )));
            }
        }

        info!(
            output = %self.output.display(),
            container = self.container.extension(),
            frames = total_frames,
            audio_inputs = self.audio_inputs.len(),
            "Starting export"
        );

        let mut child = FfmpegCommand::new()
            .args(self.ffmpeg_args())
            .spawn()
            .map_err(|e| ReelError::Encoder(format!("Failed to spawn ffmpeg: {e}")))?;
        let mut stdin = child
            .take_stdin()
            .ok_or_else(|| ReelError::Encoder("Failed to open ffmpeg stdin".into()))?;
        // Drains ffmpeg's output on background threads so the pipes never fill.
        let events = child
            .iter()
            .map_err(|e| ReelError::Encoder(format!("Failed to read ffmpeg output: {e}")))?;

        let (width, height) = self.frame_size();
        let mut frame = vec![0u8; width as usize * height as usize * 4];
        let start_time = Instant::now();

        for frame_number in 0..total_frames {
            if cancel.is_cancelled() {
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                warn!(frame = frame_number, "Export cancelled");
                return Err(ReelError::Encoder("Export cancelled".into()));
            }

            frames.fill(frame_number, &mut frame);
            stdin
                .write_all(&frame)
                .map_err(|e| ReelError::Encoder(format!("Failed to write frame: {e}")))?;

            if frame_number % 10 == 0 || frame_number == total_frames - 1 {
                let elapsed = start_time.elapsed().as_secs_f64();
                let fps = if elapsed > 0.0 {
                    (frame_number + 1) as f64 / elapsed
                } else {
                    0.0
                };
                let remaining = if fps > 0.0 {
                    (total_frames - frame_number - 1) as f64 / fps
                } else {
                    0.0
                };
                on_progress(ExportProgress {
                    current_frame: frame_number,
                    total_frames,
                    eta_seconds: remaining,
                    fps,
                });
            }
        }

        // Close stdin to signal end-of-stream
        drop(stdin);

        let mut last_error = None;
        for event in events {
            if let FfmpegEvent::Error(message) = event {
                last_error = Some(message);
            }
        }

        let status = child
            .wait()
            .map_err(|e| ReelError::Encoder(format!("Failed to wait for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(ReelError::Encoder(match last_error {
                Some(message) => format!("ffmpeg exited with status {status}: {message}"),
                None => format!("ffmpeg exited with status: {status}"),
            }));
        }

        info!(output = %self.output.display(), "Export finished");
        Ok(())
    }
}

/// Handle for cancelling an in-progress export.
#[derive(Debug, Clone)]
pub struct ExportCancel(Arc<AtomicBool>);

impl ExportCancel {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for ExportCancel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ExportJob {
        ExportJob::new("/tmp/out.mp4", Container::Mp4, CanvasBounds::default(), 10_000)
    }

    #[test]
    fn test_total_frames() {
        assert_eq!(job().total_frames(), 300);
        let mut partial = job();
        partial.duration_ms = 1010;
        // 30.3 frames round up so the tail is not dropped.
        assert_eq!(partial.total_frames(), 31);
    }

    #[test]
    fn test_video_only_args() {
        let args = job().ffmpeg_args();
        assert!(args.contains(&"800x500".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(!args.contains(&"-filter_complex".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
    }

    #[test]
    fn test_audio_is_delayed_and_mixed() {
        let job = job()
            .with_audio("/media/a.mp3", 0)
            .with_audio("/media/b.mp3", 1500);
        assert_eq!(
            job.audio_filter().unwrap(),
            "[1:a]adelay=0|0[a0];[2:a]adelay=1500|1500[a1];[a0][a1]amix=inputs=2:duration=longest[aout]"
        );
        let args = job.ffmpeg_args();
        assert!(args.contains(&"[aout]".to_string()));
        assert!(args.contains(&"aac".to_string()));
    }

    #[test]
    fn test_webm_codecs() {
        let mut job = job();
        job.container = Container::Webm;
        let args = job.ffmpeg_args();
        assert!(args.contains(&"libvpx-vp9".to_string()));
        assert_eq!("WEBM".parse::<Container>().unwrap(), Container::Webm);
        assert!("avi".parse::<Container>().is_err());
    }

    #[test]
    fn test_odd_canvas_is_rounded_even() {
        let job = ExportJob::new("o.mp4", Container::Mp4, CanvasBounds::new(801.0, 499.0), 1000);
        assert_eq!(job.frame_size(), (800, 498));
    }

    #[test]
    fn test_solid_frames() {
        let mut source = SolidFrames::from_hex("#111111").unwrap();
        let mut buf = [0u8; 8];
        source.fill(0, &mut buf);
        assert_eq!(buf, [17, 17, 17, 255, 17, 17, 17, 255]);
        assert!(SolidFrames::from_hex("#12").is_err());
    }

    #[test]
    fn test_zero_duration_is_noop() {
        let job = ExportJob::new("o.mp4", Container::Mp4, CanvasBounds::default(), 0);
        let mut frames = SolidFrames::from_hex("#000000").unwrap();
        assert!(job.run(&mut frames, |_| {}, &ExportCancel::new()).is_ok());
    }

    #[test]
    fn test_progress_fraction() {
        let progress = ExportProgress {
            current_frame: 50,
            total_frames: 200,
            eta_seconds: 10.0,
            fps: 30.0,
        };
        assert!((progress.fraction() - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_cancel_handle() {
        let cancel = ExportCancel::new();
        assert!(!cancel.is_cancelled());
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }
}
