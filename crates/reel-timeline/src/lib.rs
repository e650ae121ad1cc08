//! Reel Timeline - element model and edit state
//!
//! - Editor elements (video, audio, image, text) and timelines
//! - The timeline registry with its active timeline and selection
//! - Edit operations (split, merge, ripple, time-frame updates) with undo/redo
//! - Snapping to element edges
//! - Animation declarations and versioned project files

pub mod animation;
pub mod edit;
pub mod element;
pub mod project;
pub mod registry;
pub mod serialization;
pub mod snapping;
pub mod timeline;

pub use animation::{Animation, AnimationKind, Direction, SlideProps, TextReveal};
pub use edit::{EditCommand, HistoryStep, UndoStack};
pub use element::{
    EditorElement, Effect, ElementKind, ElementType, MediaSource, TextProps, VisualHandle,
    MERGED_SUFFIX, SPLIT_SUFFIX, TRIMMED_SUFFIX,
};
pub use project::{Project, DEFAULT_BACKGROUND};
pub use registry::{TimelineRegistry, DEFAULT_TIMELINE_NAME};
pub use serialization::{ProjectFile, CURRENT_VERSION};
pub use snapping::{SnapEdge, SnapPoint, DEFAULT_SNAP_THRESHOLD};
pub use timeline::Timeline;
