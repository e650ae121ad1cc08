//! Animation declarations attached to elements.
//!
//! These are the persisted, user-editable records. Turning them into sampled
//! property ramps is the engine's job.

use reel_core::Millis;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Edge of the canvas a slide enters from or exits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
}

/// How text elements are revealed during a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextReveal {
    /// The text block moves as one.
    #[default]
    Whole,
    /// Each character slides in on its own, staggered.
    ByCharacter,
}

/// Parameters of a slide animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideProps {
    pub direction: Direction,
    /// Restrict drawing to the element's neighbourhood while sliding.
    #[serde(default)]
    pub use_clip_mask: bool,
    #[serde(default)]
    pub text_reveal: TextReveal,
}

impl SlideProps {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            use_clip_mask: false,
            text_reveal: TextReveal::Whole,
        }
    }
}

/// What an animation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnimationKind {
    FadeIn,
    FadeOut,
    SlideIn(SlideProps),
    SlideOut(SlideProps),
    Breathe,
}

impl AnimationKind {
    pub fn is_slide_in(&self) -> bool {
        matches!(self, Self::SlideIn(_))
    }

    pub fn is_slide_out(&self) -> bool {
        matches!(self, Self::SlideOut(_))
    }
}

/// An animation attached to one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    pub id: Uuid,
    /// Element this animation drives; unknown targets are ignored.
    pub target_id: Uuid,
    /// Ramp duration in milliseconds (unused by `Breathe`).
    pub duration: Millis,
    #[serde(flatten)]
    pub kind: AnimationKind,
}

impl Animation {
    pub fn new(target_id: Uuid, duration: Millis, kind: AnimationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_id,
            duration: duration.max(0),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_serializes_flat() {
        let anim = Animation::new(
            Uuid::nil(),
            500,
            AnimationKind::SlideIn(SlideProps {
                direction: Direction::Left,
                use_clip_mask: true,
                text_reveal: TextReveal::ByCharacter,
            }),
        );
        let json = serde_json::to_value(anim).unwrap();
        assert_eq!(json["type"], "slideIn");
        assert_eq!(json["direction"], "left");
        assert_eq!(json["textReveal"], "byCharacter");

        let back: Animation = serde_json::from_value(json).unwrap();
        assert_eq!(back, anim);
    }

    #[test]
    fn test_negative_duration_clamped() {
        let anim = Animation::new(Uuid::nil(), -10, AnimationKind::FadeIn);
        assert_eq!(anim.duration, 0);
    }
}
