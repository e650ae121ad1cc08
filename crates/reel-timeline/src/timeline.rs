//! Timelines: ordered collections of editor elements.

use reel_core::Millis;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::EditorElement;

/// An ordered, independently-durationed collection of elements.
///
/// Element order is insertion (z/track) order, not time order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// Unique timeline ID
    pub id: Uuid,
    /// Timeline name
    pub name: String,
    /// Elements in sequence order
    pub elements: Vec<EditorElement>,
    /// Nominal duration, independent of element extents
    pub duration: Millis,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new(name: impl Into<String>, duration: Millis) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            elements: Vec::new(),
            duration,
        }
    }

    /// Latest element end, or zero when empty.
    pub fn max_end(&self) -> Millis {
        self.elements
            .iter()
            .map(|e| e.time_frame.end)
            .max()
            .unwrap_or(0)
    }

    /// Duration covering both the nominal duration and every element.
    pub fn extent(&self) -> Millis {
        self.duration.max(self.max_end())
    }

    /// Index of the element with the given id.
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Find an element by id.
    pub fn find(&self, id: Uuid) -> Option<&EditorElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Find an element mutably by id.
    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut EditorElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Whether an element with this id is present.
    pub fn contains(&self, id: Uuid) -> bool {
        self.position(id).is_some()
    }

    /// Insert at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, element: EditorElement) {
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
    }

    /// Append at the end.
    pub fn push(&mut self, element: EditorElement) {
        self.elements.push(element);
    }

    /// Remove the element with the given id. Returns (index, element).
    pub fn remove(&mut self, id: Uuid) -> Option<(usize, EditorElement)> {
        let index = self.position(id)?;
        Some((index, self.elements.remove(index)))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the timeline has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
