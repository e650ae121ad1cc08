//! Reel Engine - playback, animation and render sync
//!
//! - `PlaybackClock`: frame-quantized playhead driven by a wall clock
//! - Animation schedule compiler and sampler
//! - Render sync bridge over a retained-mode `RenderSurface`
//! - Media library and engine configuration
//! - `EditorSession`: the context object tying it all together

pub mod animation;
pub mod config;
pub mod library;
pub mod playback;
pub mod session;
pub mod sync;
pub mod text;

pub use animation::{compile, Property, Ramp, Schedule, Target};
pub use config::EngineConfig;
pub use library::{MediaLibrary, MediaResource, ResourceKind, SortKey, SortOrder};
pub use playback::{ManualClock, PlaybackClock, PlaybackMode, SystemClock, WallClock};
pub use session::{group_videos, sort_clips_by_topic, EditorSession, GroupingTicket, TrimTicket};
pub use sync::{
    GlyphSpec, HeadlessSurface, RenderSurface, SurfaceEvent, VisualSpec, VisualUpdate,
};
pub use text::{layout_glyphs, Glyph};
