//! Geometric primitives shared with the render surface.

use bytemuck::{Pod, Zeroable};
use glam::Vec2 as GlamVec2;
use serde::{Deserialize, Serialize};

/// 2D vector.
pub type Vec2 = GlamVec2;

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Minimum corner (top-left).
    #[inline]
    pub fn min(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Maximum corner (bottom-right).
    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    /// Grow the rectangle by `amount` on every side.
    pub fn inflate(self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Size of the drawing canvas the render surface exposes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub width: f32,
    pub height: f32,
}

impl CanvasBounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The whole canvas as a rectangle at the origin.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self::new(800.0, 500.0)
    }
}

/// Spatial placement of an element on the canvas.
///
/// `width`/`height` are the unscaled size; the drawn size is multiplied by
/// `scale_x`/`scale_y`. Rotation is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Placement {
    /// Placement at the origin with the given unscaled size.
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Placement sized 100 units tall with the given aspect ratio.
    ///
    /// Falls back to a square when the aspect ratio is not a usable number.
    pub fn from_aspect_ratio(aspect: f32) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Self::sized(100.0 * aspect, 100.0)
    }

    /// Top-left position.
    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Drawn bounds, ignoring rotation.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.width * self.scale_x,
            self.height * self.scale_y,
        )
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::sized(100.0, 100.0)
    }
}
