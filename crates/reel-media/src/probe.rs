//! Media file probing to get metadata without a full decode.

use std::path::Path;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use reel_core::{Millis, ReelError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What is known about an imported media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    /// Playable duration; unknown for stills and unprobeable files
    pub duration_ms: Option<Millis>,
    pub intrinsic_width: Option<u32>,
    pub intrinsic_height: Option<u32>,
    pub byte_size: u64,
    /// Unix time of import, in milliseconds
    pub import_timestamp: u64,
}

impl MediaInfo {
    /// Info for a file that could not be probed.
    pub fn fallback(byte_size: u64) -> Self {
        Self {
            duration_ms: None,
            intrinsic_width: None,
            intrinsic_height: None,
            byte_size,
            import_timestamp: now_ms(),
        }
    }

    /// Width over height, if both are known and non-zero.
    pub fn aspect_ratio(&self) -> Option<f32> {
        match (self.intrinsic_width, self.intrinsic_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(w as f32 / h as f32),
            _ => None,
        }
    }
}

/// Something that can read media metadata.
pub trait Prober {
    fn probe(&self, path: &Path) -> Result<MediaInfo>;
}

/// Probes by shelling out to `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: String,
}

impl FfprobeProber {
    pub fn new() -> Self {
        Self {
            program: "ffprobe".to_string(),
        }
    }

    /// Use a specific ffprobe binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<MediaInfo> {
        if !path.exists() {
            return Err(ReelError::NotFound(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let output = Command::new(&self.program)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .map_err(|e| ReelError::Media(format!("Failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(ReelError::Media(format!(
                "{} exited with status: {}",
                self.program, output.status
            )));
        }

        let mut info = parse_ffprobe_json(&output.stdout)?;
        if info.byte_size == 0 {
            info.byte_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        }
        debug!(path = %path.display(), duration_ms = ?info.duration_ms, "Probed media");
        Ok(info)
    }
}

/// Probe `path`, turning any failure into [`MediaInfo::fallback`].
pub fn probe_or_fallback(prober: &dyn Prober, path: &Path) -> MediaInfo {
    match prober.probe(path) {
        Ok(info) => info,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Probe failed, using fallback metadata");
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            MediaInfo::fallback(size)
        }
    }
}

// ── ffprobe output ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

fn seconds_to_ms(s: &str) -> Option<Millis> {
    let secs: f64 = s.trim().parse().ok()?;
    secs.is_finite().then(|| (secs * 1000.0).round() as Millis)
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub(crate) fn parse_ffprobe_json(data: &[u8]) -> Result<MediaInfo> {
    let parsed: FfprobeOutput = serde_json::from_slice(data)
        .map_err(|e| ReelError::Media(format!("Invalid ffprobe output: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let duration_ms = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(seconds_to_ms)
        .or_else(|| {
            parsed
                .streams
                .iter()
                .filter_map(|s| s.duration.as_deref().and_then(seconds_to_ms))
                .max()
        });

    let byte_size = parsed
        .format
        .as_ref()
        .and_then(|f| f.size.as_deref())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    Ok(MediaInfo {
        duration_ms,
        intrinsic_width: video.and_then(|s| s.width),
        intrinsic_height: video.and_then(|s| s.height),
        byte_size,
        import_timestamp: now_ms(),
    })
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
