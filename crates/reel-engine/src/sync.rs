//! Bridge between the element model and a retained-mode render surface.
//!
//! The surface owns its visual objects; elements only hold a
//! [`VisualHandle`] into it. [`reconcile`] makes the surface's object set
//! match the active timeline after structural changes, and [`sync_frame`]
//! pushes per-frame visibility and animated properties.

use std::collections::HashMap;

use reel_core::{CanvasBounds, Placement, ReelError, Rect, Result};
use reel_timeline::{EditorElement, Effect, ElementKind, ElementType, TimelineRegistry, VisualHandle};
use tracing::{debug, error};
use uuid::Uuid;

use crate::animation::{Property, Schedule, Target};

/// Everything the surface needs to build or refresh an element's visual.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSpec {
    pub element_type: ElementType,
    pub placement: Placement,
    pub effect: Effect,
    /// Media location for video and image elements.
    pub source_url: Option<String>,
    pub text: Option<String>,
    pub font_size: f32,
    pub font_weight: u16,
}

impl VisualSpec {
    /// Spec for a visual element; `None` for audio.
    pub fn from_element(element: &EditorElement) -> Option<Self> {
        let mut spec = Self {
            element_type: element.element_type(),
            placement: element.placement,
            effect: Effect::None,
            source_url: None,
            text: None,
            font_size: 0.0,
            font_weight: 0,
        };
        match &element.kind {
            ElementKind::Audio { .. } => return None,
            ElementKind::Video { source, effect } | ElementKind::Image { source, effect } => {
                spec.source_url = Some(source.url.clone());
                spec.effect = *effect;
            }
            ElementKind::Text(props) => {
                spec.text = Some(props.text.clone());
                spec.font_size = props.font_size;
                spec.font_weight = props.font_weight;
            }
        }
        Some(spec)
    }
}

/// Per-frame state of one visual object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualUpdate {
    pub visible: bool,
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

/// One character object of a text element during a character reveal.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSpec {
    pub index: usize,
    pub ch: char,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub font_weight: u16,
}

/// Gesture reported by the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The user moved, resized or retyped a visual.
    Modified {
        element_id: Uuid,
        placement: Placement,
        text: Option<String>,
    },
    Selected(Uuid),
    Cleared,
}

/// Retained-mode drawing surface.
pub trait RenderSurface {
    fn canvas(&self) -> CanvasBounds;

    /// Create a visual object for an element.
    fn create(&mut self, element_id: Uuid, spec: &VisualSpec) -> VisualHandle;

    /// Refresh an existing object. Returns `false` for unknown handles.
    fn update(&mut self, handle: VisualHandle, spec: &VisualSpec) -> bool;

    /// Every live object and the element it belongs to.
    fn objects(&self) -> Vec<(Uuid, VisualHandle)>;

    fn remove(&mut self, handle: VisualHandle);

    fn apply(&mut self, handle: VisualHandle, update: &VisualUpdate);

    /// Mark the selected object, or clear the mark.
    fn set_active(&mut self, handle: Option<VisualHandle>);

    fn set_clip_mask(&mut self, handle: VisualHandle, mask: Option<Rect>);

    fn set_background(&mut self, color: &str);

    /// Replace the glyph objects of a text element.
    fn upsert_glyphs(&mut self, element_id: Uuid, glyphs: &[GlyphSpec]);

    fn clear_glyphs(&mut self, element_id: Uuid);

    fn apply_glyph(&mut self, element_id: Uuid, index: usize, update: &VisualUpdate);

    /// Seek the element's media to `local_ms` and start or stop it.
    fn sync_media(&mut self, element_id: Uuid, local_ms: f64, playing: bool);
}

// ── Reconciliation ──────────────────────────────────────────────

/// Bring the surface in line with the active timeline.
///
/// Objects of elements that left the visible set are removed, missing ones
/// are created and existing ones refreshed. An element holding a handle the
/// surface does not know is a corrupted model and aborts with
/// [`ReelError::Invariant`].
pub fn reconcile<S: RenderSurface + ?Sized>(
    surface: &mut S,
    registry: &mut TimelineRegistry,
    schedule: &Schedule,
) -> Result<()> {
    let live: Vec<Uuid> = registry.elements().iter().map(|e| e.id).collect();

    for (element_id, handle) in surface.objects() {
        let owned = registry
            .element(element_id)
            .is_some_and(|e| e.visual == Some(handle));
        if !owned {
            surface.remove(handle);
            surface.clear_glyphs(element_id);
            debug!(element = %element_id, "Removed orphaned visual");
        }
    }

    for id in live {
        let Some(element) = registry.element_mut(id) else {
            continue;
        };
        let Some(spec) = VisualSpec::from_element(element) else {
            continue;
        };

        let handle = match element.visual {
            Some(handle) => {
                if !surface.update(handle, &spec) {
                    error!(element = %id, handle = handle.0, "Element holds an unknown visual handle");
                    return Err(ReelError::Invariant(format!(
                        "element {id} holds unknown visual handle {}",
                        handle.0
                    )));
                }
                handle
            }
            None => {
                let handle = surface.create(id, &spec);
                element.visual = Some(handle);
                handle
            }
        };
        surface.set_clip_mask(handle, schedule.clip_mask(id));

        match (schedule.glyphs(id), &element.kind) {
            (Some(glyphs), ElementKind::Text(props)) => {
                let specs: Vec<GlyphSpec> = glyphs
                    .iter()
                    .map(|g| GlyphSpec {
                        index: g.index,
                        ch: g.ch,
                        x: g.position.x,
                        y: g.position.y,
                        font_size: props.font_size,
                        font_weight: props.font_weight,
                    })
                    .collect();
                surface.upsert_glyphs(id, &specs);
            }
            _ => surface.clear_glyphs(id),
        }
    }

    let active = registry.selected_element().and_then(|e| e.visual);
    surface.set_active(active);
    Ok(())
}

/// Detach and destroy every visual of the active timeline.
pub fn release_visuals<S: RenderSurface + ?Sized>(surface: &mut S, registry: &mut TimelineRegistry) {
    let ids: Vec<Uuid> = registry.elements().iter().map(|e| e.id).collect();
    for id in ids {
        if let Some(element) = registry.element_mut(id) {
            if let Some(handle) = element.visual.take() {
                surface.remove(handle);
            }
            surface.clear_glyphs(id);
        }
    }
    surface.set_active(None);
}

// ── Per-frame sync ──────────────────────────────────────────────

fn sampled(schedule: &Schedule, target: Target, property: Property, t: f64, rest: f32) -> f32 {
    schedule
        .sample(target, property, t)
        .map_or(rest, |v| v as f32)
}

/// Frame state of an element at `t`.
pub fn visual_state(element: &EditorElement, schedule: &Schedule, t: f64) -> VisualUpdate {
    let target = Target::Element(element.id);
    let p = &element.placement;
    VisualUpdate {
        visible: element.is_visible_at(t),
        x: sampled(schedule, target, Property::X, t, p.x),
        y: sampled(schedule, target, Property::Y, t, p.y),
        opacity: sampled(schedule, target, Property::Opacity, t, 1.0),
        scale_x: sampled(schedule, target, Property::ScaleX, t, p.scale_x),
        scale_y: sampled(schedule, target, Property::ScaleY, t, p.scale_y),
    }
}

/// Push visibility and animated properties for time `t`.
pub fn sync_frame<S: RenderSurface + ?Sized>(
    surface: &mut S,
    elements: &[EditorElement],
    schedule: &Schedule,
    t: f64,
) {
    for element in elements {
        let Some(handle) = element.visual else {
            continue;
        };
        let state = visual_state(element, schedule, t);
        surface.apply(handle, &state);

        if let Some(glyphs) = schedule.glyphs(element.id) {
            for glyph in glyphs {
                let target = Target::Glyph {
                    element: element.id,
                    index: glyph.index,
                };
                let update = VisualUpdate {
                    visible: state.visible,
                    x: sampled(schedule, target, Property::X, t, glyph.position.x),
                    y: sampled(schedule, target, Property::Y, t, glyph.position.y),
                    opacity: sampled(schedule, target, Property::Opacity, t, 0.0),
                    scale_x: element.placement.scale_x,
                    scale_y: element.placement.scale_y,
                };
                surface.apply_glyph(element.id, glyph.index, &update);
            }
        }
    }
}

/// Align video and audio playback with the playhead.
pub fn sync_media<S: RenderSurface + ?Sized>(
    surface: &mut S,
    elements: &[EditorElement],
    t: f64,
    playing: bool,
) {
    for element in elements {
        if matches!(
            element.kind,
            ElementKind::Video { .. } | ElementKind::Audio { .. }
        ) {
            let local = t - element.time_frame.start as f64;
            surface.sync_media(element.id, local, playing);
        }
    }
}

// ── Headless surface ────────────────────────────────────────────

/// A visual object held by [`HeadlessSurface`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessObject {
    pub element_id: Uuid,
    pub spec: VisualSpec,
    pub state: Option<VisualUpdate>,
    pub clip_mask: Option<Rect>,
}

/// Glyph objects of one text element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessGlyphs {
    pub specs: Vec<GlyphSpec>,
    pub states: HashMap<usize, VisualUpdate>,
}

/// Render surface that records what it is told. Draws nothing.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    canvas: CanvasBounds,
    next_handle: u64,
    objects: HashMap<VisualHandle, HeadlessObject>,
    glyphs: HashMap<Uuid, HeadlessGlyphs>,
    media: HashMap<Uuid, (f64, bool)>,
    active: Option<VisualHandle>,
    background: String,
}

impl HeadlessSurface {
    pub fn new(canvas: CanvasBounds) -> Self {
        Self {
            canvas,
            next_handle: 1,
            objects: HashMap::new(),
            glyphs: HashMap::new(),
            media: HashMap::new(),
            active: None,
            background: String::new(),
        }
    }

    pub fn object(&self, handle: VisualHandle) -> Option<&HeadlessObject> {
        self.objects.get(&handle)
    }

    /// The object belonging to an element.
    pub fn object_for(&self, element_id: Uuid) -> Option<&HeadlessObject> {
        self.objects.values().find(|o| o.element_id == element_id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn active(&self) -> Option<VisualHandle> {
        self.active
    }

    pub fn glyphs(&self, element_id: Uuid) -> Option<&HeadlessGlyphs> {
        self.glyphs.get(&element_id)
    }

    /// Last media position and play state pushed for an element.
    pub fn media(&self, element_id: Uuid) -> Option<(f64, bool)> {
        self.media.get(&element_id).copied()
    }

    pub fn background(&self) -> &str {
        &self.background
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(CanvasBounds::default())
    }
}

impl RenderSurface for HeadlessSurface {
    fn canvas(&self) -> CanvasBounds {
        self.canvas
    }

    fn create(&mut self, element_id: Uuid, spec: &VisualSpec) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.objects.insert(
            handle,
            HeadlessObject {
                element_id,
                spec: spec.clone(),
                state: None,
                clip_mask: None,
            },
        );
        handle
    }

    fn update(&mut self, handle: VisualHandle, spec: &VisualSpec) -> bool {
        match self.objects.get_mut(&handle) {
            Some(object) => {
                object.spec = spec.clone();
                true
            }
            None => false,
        }
    }

    fn objects(&self) -> Vec<(Uuid, VisualHandle)> {
        self.objects
            .iter()
            .map(|(handle, object)| (object.element_id, *handle))
            .collect()
    }

    fn remove(&mut self, handle: VisualHandle) {
        self.objects.remove(&handle);
        if self.active == Some(handle) {
            self.active = None;
        }
    }

    fn apply(&mut self, handle: VisualHandle, update: &VisualUpdate) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.state = Some(*update);
        }
    }

    fn set_active(&mut self, handle: Option<VisualHandle>) {
        self.active = handle.filter(|h| self.objects.contains_key(h));
    }

    fn set_clip_mask(&mut self, handle: VisualHandle, mask: Option<Rect>) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.clip_mask = mask;
        }
    }

    fn set_background(&mut self, color: &str) {
        self.background = color.to_string();
    }

    fn upsert_glyphs(&mut self, element_id: Uuid, glyphs: &[GlyphSpec]) {
        let entry = self.glyphs.entry(element_id).or_default();
        if entry.specs != glyphs {
            entry.specs = glyphs.to_vec();
            entry.states.clear();
        }
    }

    fn clear_glyphs(&mut self, element_id: Uuid) {
        self.glyphs.remove(&element_id);
    }

    fn apply_glyph(&mut self, element_id: Uuid, index: usize, update: &VisualUpdate) {
        if let Some(glyphs) = self.glyphs.get_mut(&element_id) {
            glyphs.states.insert(index, *update);
        }
    }

    fn sync_media(&mut self, element_id: Uuid, local_ms: f64, playing: bool) {
        self.media.insert(element_id, (local_ms, playing));
    }
}
