//! Per-character text layout used by character-reveal animations.
//!
//! Layout is a monospace approximation: every character advances by the same
//! fraction of the font size and lines are a fixed multiple of it apart.

use reel_core::{Placement, Vec2};
use reel_timeline::TextProps;

/// Character advance as a fraction of the font size.
pub const CHAR_ADVANCE: f32 = 0.6;
/// Line height as a fraction of the font size.
pub const LINE_HEIGHT: f32 = 1.16;

/// One positioned character of a text element.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Position among the laid-out glyphs (newlines are not counted).
    pub index: usize,
    pub ch: char,
    /// Canvas position of the glyph's top-left corner.
    pub position: Vec2,
}

impl Glyph {
    /// Offset from the owning element's top-left corner.
    pub fn offset(&self, placement: &Placement) -> Vec2 {
        self.position - placement.position()
    }
}

/// Split `props.text` into glyphs positioned relative to `placement`.
pub fn layout_glyphs(props: &TextProps, placement: &Placement) -> Vec<Glyph> {
    let advance = props.font_size * CHAR_ADVANCE * placement.scale_x;
    let line_height = props.font_size * LINE_HEIGHT * placement.scale_y;

    let mut glyphs = Vec::with_capacity(props.text.len());
    let mut line = 0usize;
    let mut column = 0usize;
    for ch in props.text.chars() {
        if ch == '\n' {
            line += 1;
            column = 0;
            continue;
        }
        glyphs.push(Glyph {
            index: glyphs.len(),
            ch,
            position: Vec2::new(
                placement.x + column as f32 * advance,
                placement.y + line as f32 * line_height,
            ),
        });
        column += 1;
    }
    glyphs
}
