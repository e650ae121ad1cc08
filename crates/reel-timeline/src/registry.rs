//! Timeline registry: every timeline of a session plus the active one.

use std::collections::HashSet;

use reel_core::Millis;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::edit::EditCommand;
use crate::element::EditorElement;
use crate::timeline::Timeline;

/// Name given to the timeline created on demand by the first insert.
pub const DEFAULT_TIMELINE_NAME: &str = "Timeline 1";

/// Named timelines, the active timeline, the selection and the time bound.
///
/// The visible element set is always the active timeline's elements, and no
/// element id occurs twice across all timelines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineRegistry {
    timelines: Vec<Timeline>,
    active: Option<Uuid>,
    #[serde(skip)]
    selected: Option<Uuid>,
    max_time: Millis,
}

impl TimelineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new empty timeline; it becomes active if none is.
    pub fn create_timeline(&mut self, name: impl Into<String>) -> Uuid {
        let timeline = Timeline::new(name, self.max_time);
        let id = timeline.id;
        debug!(timeline = %id, name = %timeline.name, "Timeline created");
        self.timelines.push(timeline);
        if self.active.is_none() {
            self.set_active_timeline(id);
        }
        id
    }

    /// Make `id` the active timeline. Unknown ids are ignored.
    pub fn set_active_timeline(&mut self, id: Uuid) -> bool {
        let Some(timeline) = self.timelines.iter().find(|t| t.id == id) else {
            return false;
        };
        self.max_time = timeline.extent();
        if let Some(selected) = self.selected {
            if !timeline.contains(selected) {
                self.selected = None;
            }
        }
        self.active = Some(id);
        debug!(timeline = %id, max_time = self.max_time, "Active timeline changed");
        true
    }

    /// All timelines in creation order.
    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    /// Look up a timeline by id.
    pub fn timeline(&self, id: Uuid) -> Option<&Timeline> {
        self.timelines.iter().find(|t| t.id == id)
    }

    pub(crate) fn timeline_mut(&mut self, id: Uuid) -> Option<&mut Timeline> {
        self.timelines.iter_mut().find(|t| t.id == id)
    }

    /// ID of the active timeline.
    pub fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    /// The active timeline.
    pub fn active(&self) -> Option<&Timeline> {
        self.active.and_then(|id| self.timeline(id))
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut Timeline> {
        let id = self.active?;
        self.timeline_mut(id)
    }

    /// The visible element set (empty when no timeline is active).
    pub fn elements(&self) -> &[EditorElement] {
        self.active().map(|t| t.elements.as_slice()).unwrap_or(&[])
    }

    /// Find an element of the active timeline.
    pub fn element(&self, id: Uuid) -> Option<&EditorElement> {
        self.active().and_then(|t| t.find(id))
    }

    /// Find an element of the active timeline mutably.
    ///
    /// Only the engine's update path should call this; it does not bump the revision.
    pub fn element_mut(&mut self, id: Uuid) -> Option<&mut EditorElement> {
        self.active_mut().and_then(|t| t.find_mut(id))
    }

    /// Forget every visual handle, in all timelines.
    pub fn detach_visuals(&mut self) {
        for timeline in &mut self.timelines {
            for element in &mut timeline.elements {
                element.visual = None;
            }
        }
    }

    /// Restore the registry invariants on freshly deserialized data.
    ///
    /// Keeps only the first occurrence of every element id, points `active`
    /// at an existing timeline (the first one, or none when there are no
    /// timelines) and clears the selection. Returns how many elements were
    /// dropped.
    pub fn normalize(&mut self) -> usize {
        let mut seen = HashSet::new();
        let mut dropped = 0;
        for timeline in &mut self.timelines {
            let before = timeline.elements.len();
            timeline.elements.retain(|e| seen.insert(e.id));
            dropped += before - timeline.elements.len();
        }
        if dropped > 0 {
            warn!(dropped, "Dropped elements with duplicate ids");
        }

        if self.active.map_or(true, |id| self.timeline(id).is_none()) {
            let fallback = self.timelines.first().map(|t| t.id);
            if let Some(stale) = self.active {
                warn!(timeline = %stale, fallback = ?fallback, "Active timeline does not exist");
            }
            self.active = fallback;
        }
        self.selected = None;
        self.cover_elements();
        dropped
    }

    /// Whether any timeline holds an element with this id.
    pub fn contains_anywhere(&self, id: Uuid) -> bool {
        self.timelines.iter().any(|t| t.contains(id))
    }

    /// Append an element to the active timeline and select it.
    ///
    /// Creates a default timeline first if none is active. Duplicate ids are rejected.
    pub fn add_element(&mut self, element: EditorElement) -> Option<EditCommand> {
        if self.contains_anywhere(element.id) {
            debug!(element = %element.id, "Rejected duplicate element id");
            return None;
        }
        if self.active.is_none() {
            self.create_timeline(DEFAULT_TIMELINE_NAME);
        }
        let timeline = self.active()?;
        let timeline_id = timeline.id;
        let index = timeline.elements.len();
        let element_id = element.id;
        let mut cmd = EditCommand::Insert {
            timeline_id,
            index,
            element,
        };
        cmd.apply(self);
        self.selected = Some(element_id);
        Some(cmd)
    }

    /// Remove an element from the active timeline.
    pub fn remove_element(&mut self, id: Uuid) -> Option<EditCommand> {
        let timeline_id = self.active?;
        if !self.active()?.contains(id) {
            return None;
        }
        let mut cmd = EditCommand::Remove {
            timeline_id,
            element_id: id,
            removed: None,
        };
        cmd.apply(self);
        Some(cmd)
    }

    /// Current upper bound of the playhead.
    pub fn max_time(&self) -> Millis {
        self.max_time
    }

    /// Set the time bound, never below the latest element end.
    ///
    /// The active timeline's nominal duration follows the new bound.
    pub fn set_max_time(&mut self, max_time: Millis) {
        let max_end = self.active().map(|t| t.max_end()).unwrap_or(0);
        self.max_time = max_time.max(max_end).max(0);
        let max_time = self.max_time;
        if let Some(timeline) = self.active_mut() {
            timeline.duration = max_time;
        }
    }

    /// Grow the time bound to cover every element of the active timeline.
    pub(crate) fn cover_elements(&mut self) {
        let max_end = self.active().map(|t| t.max_end()).unwrap_or(0);
        if max_end > self.max_time {
            self.max_time = max_end;
        }
    }

    /// The selected element id, if it is still in the active timeline.
    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    /// The selected element.
    pub fn selected_element(&self) -> Option<&EditorElement> {
        self.selected.and_then(|id| self.element(id))
    }

    /// Select an element of the active timeline, or clear the selection.
    ///
    /// Unknown ids clear the selection. Returns whether the selection changed.
    pub fn select(&mut self, id: Option<Uuid>) -> bool {
        let next = id.filter(|id| self.element(*id).is_some());
        let changed = next != self.selected;
        self.selected = next;
        changed
    }

    pub(crate) fn clear_selection_of(&mut self, id: Uuid) {
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Reorder the active timeline's elements. `order` must be a permutation of its ids.
    pub fn reorder_elements(&mut self, order: &[Uuid]) -> bool {
        let Some(timeline) = self.active_mut() else {
            return false;
        };
        if order.len() != timeline.len() || !order.iter().all(|id| timeline.contains(*id)) {
            return false;
        }
        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            if let Some((_, element)) = timeline.remove(*id) {
                reordered.push(element);
            }
        }
        if !timeline.is_empty() {
            // Duplicate ids in `order`; put back what was left behind.
            reordered.append(&mut timeline.elements);
        }
        timeline.elements = reordered;
        true
    }
}
