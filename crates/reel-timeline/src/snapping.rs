//! Snapping of times to element edges.

use reel_core::Millis;
use uuid::Uuid;

use crate::registry::TimelineRegistry;

/// Default snap distance in milliseconds.
pub const DEFAULT_SNAP_THRESHOLD: Millis = 100;

/// Which edge of an element a snap point sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapEdge {
    Start,
    End,
}

/// A time that can be snapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapPoint {
    pub time: Millis,
    pub element_id: Uuid,
    pub edge: SnapEdge,
}

impl TimelineRegistry {
    /// Every element edge in the active timeline, in sequence order, start before end.
    pub fn snap_points(&self) -> Vec<SnapPoint> {
        let mut points = Vec::with_capacity(self.elements().len() * 2);
        for element in self.elements() {
            points.push(SnapPoint {
                time: element.time_frame.start,
                element_id: element.id,
                edge: SnapEdge::Start,
            });
            points.push(SnapPoint {
                time: element.time_frame.end,
                element_id: element.id,
                edge: SnapEdge::End,
            });
        }
        points
    }

    /// Snap `time` to the nearest element edge closer than `threshold`.
    ///
    /// Returns `time` unchanged when nothing is close enough.
    pub fn snap_to_nearest_clip(&self, time: Millis, threshold: Millis) -> Millis {
        find_snap(time, &self.snap_points(), threshold, None).unwrap_or(time)
    }

    /// Like [`snap_to_nearest_clip`](Self::snap_to_nearest_clip), ignoring the
    /// edges of `exclude` (typically the element being dragged).
    pub fn snap_excluding(&self, time: Millis, threshold: Millis, exclude: Uuid) -> Millis {
        find_snap(time, &self.snap_points(), threshold, Some(exclude)).unwrap_or(time)
    }
}

/// Find the closest snap point strictly within `threshold`.
///
/// On equal distance the earlier point wins.
pub fn find_snap(
    time: Millis,
    points: &[SnapPoint],
    threshold: Millis,
    exclude: Option<Uuid>,
) -> Option<Millis> {
    let mut best: Option<(Millis, Millis)> = None;
    for point in points {
        if exclude == Some(point.element_id) {
            continue;
        }
        let dist = (point.time - time).abs();
        if dist >= threshold {
            continue;
        }
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((point.time, dist)),
        }
    }
    best.map(|(t, _)| t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{EditorElement, MediaSource};
    use reel_core::TimeFrame;

    fn registry() -> (TimelineRegistry, Uuid) {
        let mut reg = TimelineRegistry::new();
        let a = EditorElement::video("A", MediaSource::new("a.mp4"), TimeFrame::new(0, 1000));
        let b = EditorElement::video("B", MediaSource::new("b.mp4"), TimeFrame::new(1150, 3000));
        let a_id = a.id;
        reg.add_element(a);
        reg.add_element(b);
        (reg, a_id)
    }

    #[test]
    fn test_snaps_to_nearest_edge() {
        let (reg, _) = registry();
        assert_eq!(reg.snap_to_nearest_clip(1040, DEFAULT_SNAP_THRESHOLD), 1000);
        assert_eq!(reg.snap_to_nearest_clip(1120, DEFAULT_SNAP_THRESHOLD), 1150);
        assert_eq!(reg.snap_to_nearest_clip(2950, DEFAULT_SNAP_THRESHOLD), 3000);
    }

    #[test]
    fn test_threshold_is_strict() {
        let (reg, _) = registry();
        assert_eq!(reg.snap_to_nearest_clip(2000, DEFAULT_SNAP_THRESHOLD), 2000);
        assert_eq!(reg.snap_to_nearest_clip(100, DEFAULT_SNAP_THRESHOLD), 100);
        assert_eq!(reg.snap_to_nearest_clip(99, DEFAULT_SNAP_THRESHOLD), 0);
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        let (reg, _) = registry();
        // 1075 is 75ms from both A's end and B's start.
        assert_eq!(reg.snap_to_nearest_clip(1075, DEFAULT_SNAP_THRESHOLD), 1000);
    }

    #[test]
    fn test_exclude_ignores_dragged_element() {
        let (reg, a_id) = registry();
        assert_eq!(reg.snap_excluding(1040, DEFAULT_SNAP_THRESHOLD, a_id), 1040);
        assert_eq!(reg.snap_excluding(1100, DEFAULT_SNAP_THRESHOLD, a_id), 1150);
    }

    #[test]
    fn test_empty_timeline_returns_input() {
        let reg = TimelineRegistry::new();
        assert_eq!(reg.snap_to_nearest_clip(42, DEFAULT_SNAP_THRESHOLD), 42);
    }
}
