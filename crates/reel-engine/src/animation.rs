//! Animation schedule compiler.
//!
//! Animations are declared per element ([`reel_timeline::Animation`]) and
//! compiled into a [`Schedule`]: a set of value ramps keyed by target and
//! property. The schedule is a pure function of the animations, the elements
//! they target and the canvas size, so it is rebuilt from scratch whenever
//! any of those change and sampled at arbitrary times afterwards.

use std::collections::HashMap;

use reel_core::{CanvasBounds, Placement, Rect, Vec2};
use reel_timeline::{
    Animation, AnimationKind, Direction, EditorElement, ElementKind, SlideProps, TextReveal,
};
use smallvec::SmallVec;
use tracing::trace;
use uuid::Uuid;

use crate::text::{layout_glyphs, Glyph};

/// Clip masks extend this far beyond the element bounds.
pub const CLIP_MASK_MARGIN: f32 = 50.0;
/// Extra distance a slide-out to the top travels past the canvas edge.
pub const SLIDE_OUT_TOP_OVERSHOOT: f32 = 100.0;
/// Scale reached at the peak of a breathe pulse.
pub const BREATHE_SCALE: f64 = 1.05;
/// Length of one breathe pulse: a 72 bpm beat slowed down four times.
pub const BREATHE_PERIOD_MS: f64 = 1000.0 * 60.0 / 72.0 * 4.0;

// ── Schedule model ──────────────────────────────────────────────

/// Animatable visual property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    X,
    Y,
    Opacity,
    ScaleX,
    ScaleY,
}

/// What a ramp drives: an element's visual, or one glyph of a text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Element(Uuid),
    Glyph { element: Uuid, index: usize },
}

/// A value moving linearly from `from` to `to` over
/// `[start, start + duration]`.
///
/// Zero-duration ramps are steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub start: f64,
    pub duration: f64,
    pub from: f64,
    pub to: f64,
}

impl Ramp {
    pub fn linear(start: f64, duration: f64, from: f64, to: f64) -> Self {
        Self {
            start,
            duration: duration.max(0.0),
            from,
            to,
        }
    }

    /// Instant change to `to` at `at`.
    pub fn step(at: f64, from: f64, to: f64) -> Self {
        Self::linear(at, 0.0, from, to)
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Value at `t`, holding `from` before the ramp and `to` after it.
    pub fn value_at(&self, t: f64) -> f64 {
        if t >= self.end() {
            self.to
        } else if t <= self.start {
            self.from
        } else {
            let progress = (t - self.start) / self.duration;
            self.from + (self.to - self.from) * progress
        }
    }
}

/// Compiled animation state.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    tracks: HashMap<(Target, Property), SmallVec<[Ramp; 2]>>,
    masks: HashMap<Uuid, Rect>,
    glyphs: HashMap<Uuid, Vec<Glyph>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: Target, property: Property, ramp: Ramp) {
        self.tracks.entry((target, property)).or_default().push(ramp);
    }

    /// Animated value of `property` on `target` at `t`.
    ///
    /// The latest-starting ramp that has begun wins, later-added ramps
    /// winning ties. Before any ramp begins, the earliest ramp's start value
    /// holds. `None` when nothing animates the property.
    pub fn sample(&self, target: Target, property: Property, t: f64) -> Option<f64> {
        let ramps = self.tracks.get(&(target, property))?;

        let mut active: Option<&Ramp> = None;
        for ramp in ramps {
            if ramp.start <= t && active.map_or(true, |a| ramp.start >= a.start) {
                active = Some(ramp);
            }
        }
        if let Some(ramp) = active {
            return Some(ramp.value_at(t));
        }

        let mut earliest: Option<&Ramp> = None;
        for ramp in ramps {
            if earliest.map_or(true, |e| ramp.start < e.start) {
                earliest = Some(ramp);
            }
        }
        earliest.map(|ramp| ramp.from)
    }

    /// Ramps for one target property, in insertion order.
    pub fn ramps(&self, target: Target, property: Property) -> &[Ramp] {
        self.tracks
            .get(&(target, property))
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    pub fn clip_mask(&self, element: Uuid) -> Option<Rect> {
        self.masks.get(&element).copied()
    }

    /// Glyphs split out of a text element for a character reveal.
    pub fn glyphs(&self, element: Uuid) -> Option<&[Glyph]> {
        self.glyphs.get(&element).map(|g| g.as_slice())
    }

    /// Text elements that have glyphs.
    pub fn glyph_elements(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.glyphs.keys().copied()
    }

    /// Whether anything animates `element` or its glyphs.
    pub fn animates(&self, element: Uuid) -> bool {
        self.glyphs.contains_key(&element)
            || self.tracks.keys().any(|(target, _)| match *target {
                Target::Element(id) => id == element,
                Target::Glyph { element: id, .. } => id == element,
            })
    }

    pub fn ramp_count(&self) -> usize {
        self.tracks.values().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.masks.is_empty() && self.glyphs.is_empty()
    }
}

// ── Compiler ────────────────────────────────────────────────────

/// Off-canvas position an element slides in from or out to.
///
/// The axis the direction does not move stays at the placed position.
pub fn slide_origin(
    direction: Direction,
    placement: &Placement,
    canvas: CanvasBounds,
    exiting: bool,
) -> Vec2 {
    match direction {
        Direction::Left => Vec2::new(-placement.width, placement.y),
        Direction::Right => Vec2::new(canvas.width, placement.y),
        Direction::Top if exiting => {
            Vec2::new(placement.x, -SLIDE_OUT_TOP_OVERSHOOT - placement.height)
        }
        Direction::Top => Vec2::new(placement.x, -placement.height),
        Direction::Bottom => Vec2::new(placement.x, canvas.height),
    }
}

fn add_move(schedule: &mut Schedule, target: Target, start: f64, duration: f64, from: Vec2, to: Vec2) {
    schedule.add(
        target,
        Property::X,
        Ramp::linear(start, duration, from.x as f64, to.x as f64),
    );
    schedule.add(
        target,
        Property::Y,
        Ramp::linear(start, duration, from.y as f64, to.y as f64),
    );
}

/// Build the schedule for `animations` over `elements`.
///
/// Animations whose target is missing or has no visual are skipped.
pub fn compile(animations: &[Animation], elements: &[EditorElement], canvas: CanvasBounds) -> Schedule {
    let mut schedule = Schedule::new();

    for animation in animations {
        let Some(element) = elements.iter().find(|e| e.id == animation.target_id) else {
            trace!(animation = %animation.id, "Skipping animation with missing target");
            continue;
        };
        if !element.kind.is_visual() {
            continue;
        }

        let target = Target::Element(element.id);
        let start = element.time_frame.start as f64;
        let end = element.time_frame.end as f64;
        let duration = animation.duration as f64;
        let placement = element.placement;

        match animation.kind {
            AnimationKind::FadeIn => {
                schedule.add(target, Property::Opacity, Ramp::linear(start, duration, 0.0, 1.0));
            }
            AnimationKind::FadeOut => {
                schedule.add(
                    target,
                    Property::Opacity,
                    Ramp::linear(end - duration, duration, 1.0, 0.0),
                );
            }
            AnimationKind::SlideIn(props) => {
                let origin = slide_origin(props.direction, &placement, canvas, false);
                apply_clip_mask(&mut schedule, element, props);
                if props.text_reveal == TextReveal::ByCharacter {
                    if let ElementKind::Text(text) = &element.kind {
                        let glyphs = layout_glyphs(text, &placement);
                        compile_character_reveal(&mut schedule, element, &glyphs, origin, duration);
                        schedule.glyphs.insert(element.id, glyphs);
                    }
                }
                add_move(&mut schedule, target, start, duration, origin, placement.position());
            }
            AnimationKind::SlideOut(props) => {
                let destination = slide_origin(props.direction, &placement, canvas, true);
                apply_clip_mask(&mut schedule, element, props);
                add_move(
                    &mut schedule,
                    target,
                    end - duration,
                    duration,
                    placement.position(),
                    destination,
                );
            }
            AnimationKind::Breathe => {
                compile_breathe(&mut schedule, animations, element);
            }
        }
    }

    schedule
}

fn apply_clip_mask(schedule: &mut Schedule, element: &EditorElement, props: SlideProps) {
    if props.use_clip_mask {
        schedule
            .masks
            .insert(element.id, element.placement.bounds().inflate(CLIP_MASK_MARGIN));
    }
}

/// Glyphs slide in one after another over the first half of the animation;
/// the whole text is hidden while they travel.
fn compile_character_reveal(
    schedule: &mut Schedule,
    element: &EditorElement,
    glyphs: &[Glyph],
    origin: Vec2,
    duration: f64,
) {
    if glyphs.is_empty() {
        return;
    }
    let start = element.time_frame.start as f64;
    let travel = duration / 2.0;
    let delay = travel / glyphs.len() as f64;
    let placed = element.placement.position();

    for glyph in glyphs {
        let target = Target::Glyph {
            element: element.id,
            index: glyph.index,
        };
        let offset = glyph.offset(&element.placement);
        add_move(
            schedule,
            target,
            start + glyph.index as f64 * delay,
            travel,
            origin + offset,
            placed + offset,
        );
        schedule.add(target, Property::Opacity, Ramp::step(start, 0.0, 1.0));
        schedule.add(target, Property::Opacity, Ramp::step(start + duration, 1.0, 0.0));
    }

    let whole = Target::Element(element.id);
    schedule.add(whole, Property::Opacity, Ramp::step(start, 1.0, 0.0));
    schedule.add(whole, Property::Opacity, Ramp::step(start + duration, 0.0, 1.0));
}

/// Scale pulses between the end of the slide-in and the start of the
/// slide-out, if the element has them.
fn compile_breathe(schedule: &mut Schedule, animations: &[Animation], element: &EditorElement) {
    let for_element = |pred: fn(&AnimationKind) -> bool| {
        animations
            .iter()
            .find(|a| a.target_id == element.id && pred(&a.kind))
    };
    let window_start = element.time_frame.start as f64
        + for_element(AnimationKind::is_slide_in).map_or(0.0, |a| a.duration as f64);
    let window_end = element.time_frame.end as f64
        - for_element(AnimationKind::is_slide_out).map_or(0.0, |a| a.duration as f64);

    let window = window_end - window_start;
    if window <= 0.0 {
        return;
    }
    let beats = (window / BREATHE_PERIOD_MS).floor() as usize;
    if beats < 1 {
        return;
    }

    let target = Target::Element(element.id);
    let segment = window / (2 * beats) as f64;
    for (property, rest) in [
        (Property::ScaleX, element.placement.scale_x as f64),
        (Property::ScaleY, element.placement.scale_y as f64),
    ] {
        let peak = rest * BREATHE_SCALE;
        for beat in 0..beats {
            let up = window_start + (2 * beat) as f64 * segment;
            schedule.add(target, property, Ramp::linear(up, segment, rest, peak));
            schedule.add(target, property, Ramp::linear(up + segment, segment, peak, rest));
        }
    }
}
