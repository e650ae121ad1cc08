//! Engine configuration, loaded from JSON.

use std::path::{Path, PathBuf};

use reel_core::{CanvasBounds, FrameRate, Millis, ReelError, Result};
use reel_media::Container;
use reel_timeline::{DEFAULT_BACKGROUND, DEFAULT_SNAP_THRESHOLD};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tunables of an editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Playhead quantization rate.
    pub frame_rate: FrameRate,
    /// Size of the render surface's canvas.
    pub canvas: CanvasBounds,
    /// Canvas background colour for new sessions.
    pub background_color: String,
    /// Snap distance for edge snapping, in milliseconds.
    pub snap_threshold_ms: Millis,
    /// Maximum undo history depth.
    pub undo_depth: usize,
    /// Container used when exporting.
    pub export_container: Container,
    /// Export frame rate.
    pub export_frame_rate: FrameRate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate: FrameRate::FPS_60,
            canvas: CanvasBounds::default(),
            background_color: DEFAULT_BACKGROUND.to_string(),
            snap_threshold_ms: DEFAULT_SNAP_THRESHOLD,
            undo_depth: 200,
            export_container: Container::Mp4,
            export_frame_rate: FrameRate::FPS_30,
        }
    }
}

impl EngineConfig {
    /// `<config dir>/reel/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("reel").join("config.json"))
    }

    /// Parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&data).map_err(|e| {
            ReelError::Serialization(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Load `path`, or the default location when `path` is `None`.
    ///
    /// A missing default file yields defaults silently; any other problem is
    /// logged and also yields defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Self::default(),
            },
        };
        if !explicit && !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Using default engine config");
                Self::default()
            }
        }
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)
            .map_err(|e| ReelError::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("frameRate", self.frame_rate),
            ("exportFrameRate", self.export_frame_rate),
        ] {
            if rate.numerator == 0 || rate.denominator == 0 {
                return Err(ReelError::InvalidParameter(format!(
                    "{name} must be positive, got {}/{}",
                    rate.numerator, rate.denominator
                )));
            }
        }
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return Err(ReelError::InvalidParameter(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if self.snap_threshold_ms < 0 {
            return Err(ReelError::InvalidParameter(
                "snapThresholdMs must not be negative".into(),
            ));
        }
        if self.undo_depth == 0 {
            return Err(ReelError::InvalidParameter("undoDepth must be at least 1".into()));
        }
        Ok(())
    }
}
