//! Editor elements: the items placed on a timeline.

use reel_core::{Placement, TimeFrame};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display-name suffix for the right half of a split.
pub const SPLIT_SUFFIX: &str = " (split)";
/// Display-name suffix for a merge product.
pub const MERGED_SUFFIX: &str = " (merged)";
/// Display-name suffix for a re-encoded trim result.
pub const TRIMMED_SUFFIX: &str = " (trimmed)";

/// Non-owning handle to a visual object owned by the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u64);

/// Reference to imported media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    /// Location of the media (file path or object URL)
    pub url: String,
    /// Library resource this source was created from, if any
    pub resource_id: Option<Uuid>,
}

impl MediaSource {
    /// Create a media source without a library resource.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            resource_id: None,
        }
    }
}

/// Visual effect applied by the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Effect {
    #[default]
    None,
    BlackAndWhite,
    Sepia,
    Invert,
    Saturate,
}

/// Text content and typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    pub text: String,
    pub font_size: f32,
    pub font_weight: u16,
}

/// Variant-specific element properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    Video { source: MediaSource, effect: Effect },
    Audio { source: MediaSource },
    Image { source: MediaSource, effect: Effect },
    Text(TextProps),
}

/// Variant tag without payload, for same-type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Video,
    Audio,
    Image,
    Text,
}

impl ElementKind {
    /// The variant tag.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Video { .. } => ElementType::Video,
            Self::Audio { .. } => ElementType::Audio,
            Self::Image { .. } => ElementType::Image,
            Self::Text(_) => ElementType::Text,
        }
    }

    /// Media source for media-backed variants.
    pub fn source(&self) -> Option<&MediaSource> {
        match self {
            Self::Video { source, .. } | Self::Audio { source } | Self::Image { source, .. } => {
                Some(source)
            }
            Self::Text(_) => None,
        }
    }

    /// Whether the variant draws anything on the canvas.
    pub fn is_visual(&self) -> bool {
        match self {
            Self::Video { .. } | Self::Image { .. } | Self::Text(_) => true,
            Self::Audio { .. } => false,
        }
    }
}

/// One placed media/text item on a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorElement {
    /// Unique element ID
    pub id: Uuid,
    /// Shared by every element produced from the same import through split/merge/trim
    pub origin_id: Uuid,
    /// Display name; never used as a grouping key
    pub name: String,
    pub time_frame: TimeFrame,
    pub placement: Placement,
    pub kind: ElementKind,
    /// Visual object on the render surface, if materialized
    #[serde(skip)]
    pub visual: Option<VisualHandle>,
    /// Bumped on every in-place mutation
    #[serde(skip)]
    pub revision: u64,
}

impl EditorElement {
    /// Create an element with a fresh id that is its own origin.
    pub fn new(
        name: impl Into<String>,
        kind: ElementKind,
        time_frame: TimeFrame,
        placement: Placement,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            origin_id: id,
            name: name.into(),
            time_frame,
            placement,
            kind,
            visual: None,
            revision: 0,
        }
    }

    /// Create a video element.
    pub fn video(name: impl Into<String>, source: MediaSource, time_frame: TimeFrame) -> Self {
        Self::new(
            name,
            ElementKind::Video {
                source,
                effect: Effect::None,
            },
            time_frame,
            Placement::default(),
        )
    }

    /// Create an audio element.
    pub fn audio(name: impl Into<String>, source: MediaSource, time_frame: TimeFrame) -> Self {
        Self::new(
            name,
            ElementKind::Audio { source },
            time_frame,
            Placement::default(),
        )
    }

    /// Create an image element.
    pub fn image(name: impl Into<String>, source: MediaSource, time_frame: TimeFrame) -> Self {
        Self::new(
            name,
            ElementKind::Image {
                source,
                effect: Effect::None,
            },
            time_frame,
            Placement::default(),
        )
    }

    /// Create a text element.
    pub fn text(name: impl Into<String>, props: TextProps, time_frame: TimeFrame) -> Self {
        Self::new(name, ElementKind::Text(props), time_frame, Placement::default())
    }

    /// The variant tag.
    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// A copy with a fresh id, the same origin, and `suffix` appended to the name.
    ///
    /// The copy has no visual object and starts at revision 0.
    pub fn derive(&self, suffix: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin_id: self.origin_id,
            name: format!("{}{}", self.name, suffix),
            time_frame: self.time_frame,
            placement: self.placement,
            kind: self.kind.clone(),
            visual: None,
            revision: 0,
        }
    }

    /// Record an in-place mutation.
    pub fn touch(&mut self) {
        self.revision += 1;
    }

    /// Whether the element is live at `time_ms`.
    pub fn is_visible_at(&self, time_ms: f64) -> bool {
        self.time_frame.contains(time_ms)
    }
}
