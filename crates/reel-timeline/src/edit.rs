//! Edit operations with undo/redo support.
//!
//! Every mutation of the registry is an `EditCommand` that knows how to apply
//! itself and produce its inverse. The operations on `TimelineRegistry` build a
//! command, apply it, and hand it back so the caller can record it on an
//! `UndoStack`. `None` means the operation was a silent no-op.

use std::collections::VecDeque;

use reel_core::{Millis, Placement, TimeFrame, TimeFramePatch};
use tracing::debug;
use uuid::Uuid;

use crate::element::{EditorElement, Effect, ElementKind, MERGED_SUFFIX, SPLIT_SUFFIX};
use crate::registry::TimelineRegistry;

// ── Edit commands ───────────────────────────────────────────────

/// A reversible edit on a timeline registry.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Replace an element's time frame.
    SetTimeFrame {
        timeline_id: Uuid,
        element_id: Uuid,
        before: TimeFrame,
        after: TimeFrame,
    },
    /// Replace an element's placement.
    SetPlacement {
        timeline_id: Uuid,
        element_id: Uuid,
        before: Placement,
        after: Placement,
    },
    /// Replace an element's variant properties.
    SetKind {
        timeline_id: Uuid,
        element_id: Uuid,
        before: ElementKind,
        after: ElementKind,
    },
    /// Insert an element at `index` in a timeline.
    Insert {
        timeline_id: Uuid,
        index: usize,
        element: EditorElement,
    },
    /// Remove an element from a timeline.
    Remove {
        timeline_id: Uuid,
        element_id: Uuid,
        /// Position and element, populated when the command is executed.
        removed: Option<(usize, EditorElement)>,
    },
    /// A batch of commands applied in order.
    Batch(Vec<EditCommand>),
}

impl EditCommand {
    /// Apply this command to a registry, mutating it in place.
    ///
    /// Mutable `&mut self` because `Remove` records what it removed.
    pub fn apply(&mut self, registry: &mut TimelineRegistry) {
        match self {
            Self::SetTimeFrame {
                timeline_id,
                element_id,
                after,
                ..
            } => {
                if let Some(element) = find_element_mut(registry, *timeline_id, *element_id) {
                    element.time_frame = *after;
                    element.touch();
                }
                registry.cover_elements();
            }
            Self::SetPlacement {
                timeline_id,
                element_id,
                after,
                ..
            } => {
                if let Some(element) = find_element_mut(registry, *timeline_id, *element_id) {
                    element.placement = *after;
                    element.touch();
                }
            }
            Self::SetKind {
                timeline_id,
                element_id,
                after,
                ..
            } => {
                if let Some(element) = find_element_mut(registry, *timeline_id, *element_id) {
                    element.kind = after.clone();
                    element.touch();
                }
            }
            Self::Insert {
                timeline_id,
                index,
                element,
            } => {
                if registry.contains_anywhere(element.id) {
                    debug!(element = %element.id, "Skipped insert of duplicate element");
                    return;
                }
                if let Some(timeline) = registry.timeline_mut(*timeline_id) {
                    // Surface objects of removed elements are gone; never reinsert their handles.
                    let mut element = element.clone();
                    element.visual = None;
                    timeline.insert(*index, element);
                }
                registry.cover_elements();
            }
            Self::Remove {
                timeline_id,
                element_id,
                removed,
            } => {
                if let Some(timeline) = registry.timeline_mut(*timeline_id) {
                    if let Some(entry) = timeline.remove(*element_id) {
                        *removed = Some(entry);
                    }
                }
                registry.clear_selection_of(*element_id);
            }
            Self::Batch(commands) => {
                for cmd in commands {
                    cmd.apply(registry);
                }
            }
        }
    }

    /// Produce the inverse command (for undo).
    pub fn inverse(&self) -> Self {
        match self {
            Self::SetTimeFrame {
                timeline_id,
                element_id,
                before,
                after,
            } => Self::SetTimeFrame {
                timeline_id: *timeline_id,
                element_id: *element_id,
                before: *after,
                after: *before,
            },
            Self::SetPlacement {
                timeline_id,
                element_id,
                before,
                after,
            } => Self::SetPlacement {
                timeline_id: *timeline_id,
                element_id: *element_id,
                before: *after,
                after: *before,
            },
            Self::SetKind {
                timeline_id,
                element_id,
                before,
                after,
            } => Self::SetKind {
                timeline_id: *timeline_id,
                element_id: *element_id,
                before: after.clone(),
                after: before.clone(),
            },
            Self::Insert {
                timeline_id,
                index,
                element,
            } => Self::Remove {
                timeline_id: *timeline_id,
                element_id: element.id,
                removed: Some((*index, element.clone())),
            },
            Self::Remove {
                timeline_id,
                removed,
                ..
            } => match removed {
                Some((index, element)) => Self::Insert {
                    timeline_id: *timeline_id,
                    index: *index,
                    element: element.clone(),
                },
                // Nothing was removed, so there is nothing to restore.
                None => Self::Batch(Vec::new()),
            },
            Self::Batch(commands) => {
                Self::Batch(commands.iter().rev().map(|c| c.inverse()).collect())
            }
        }
    }

    /// Whether applying the command changes nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Batch(commands) => commands.iter().all(|c| c.is_empty()),
            _ => false,
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn find_element_mut(
    registry: &mut TimelineRegistry,
    timeline_id: Uuid,
    element_id: Uuid,
) -> Option<&mut EditorElement> {
    registry
        .timeline_mut(timeline_id)
        .and_then(|t| t.find_mut(element_id))
}

/// Apply `cmd` to `registry` and return it, or `None` if it is empty.
fn execute(registry: &mut TimelineRegistry, mut cmd: EditCommand) -> Option<EditCommand> {
    if cmd.is_empty() {
        return None;
    }
    cmd.apply(registry);
    Some(cmd)
}

// ── Edit operations ─────────────────────────────────────────────

impl TimelineRegistry {
    /// Apply a partial time-frame update to an element of the active timeline.
    ///
    /// `start` is clamped to `[0, max_time]` and `end` to `[start, max_time]`.
    /// Returns `None` if the element is unknown or nothing changes.
    pub fn update_element_time_frame(
        &mut self,
        id: Uuid,
        patch: TimeFramePatch,
    ) -> Option<EditCommand> {
        let timeline_id = self.active_id()?;
        let before = self.element(id)?.time_frame;
        let after = before.patched(patch, self.max_time());
        if after == before {
            return None;
        }
        execute(
            self,
            EditCommand::SetTimeFrame {
                timeline_id,
                element_id: id,
                before,
                after,
            },
        )
    }

    /// Split an element at `time`.
    ///
    /// The original keeps `[start, time]`; a copy covering `[time, end]` is
    /// inserted right after it. No-op unless `start < time < end`.
    pub fn split_element_at_time(&mut self, id: Uuid, time: Millis) -> Option<EditCommand> {
        let timeline_id = self.active_id()?;
        let timeline = self.active()?;
        let index = timeline.position(id)?;
        let original = &timeline.elements[index];
        let before = original.time_frame;
        let (left, right) = before.split_at(time)?;

        let mut right_half = original.derive(SPLIT_SUFFIX);
        right_half.time_frame = right;
        debug!(element = %id, at = time, split = %right_half.id, "Splitting element");

        execute(
            self,
            EditCommand::Batch(vec![
                EditCommand::SetTimeFrame {
                    timeline_id,
                    element_id: id,
                    before,
                    after: left,
                },
                EditCommand::Insert {
                    timeline_id,
                    index: index + 1,
                    element: right_half,
                },
            ]),
        )
    }

    /// Merge contiguous same-variant elements into one.
    ///
    /// Requires at least two distinct ids, all in the active timeline. Sorted by
    /// start, each element must begin exactly where the previous one ends. The
    /// result inherits the earliest element's properties and origin, replaces
    /// the originals, is appended, and becomes the selection.
    pub fn merge_elements(&mut self, ids: &[Uuid]) -> Option<EditCommand> {
        let timeline_id = self.active_id()?;
        let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.len() < 2 {
            return None;
        }

        let mut parts = Vec::with_capacity(unique.len());
        for id in &unique {
            parts.push(self.element(*id)?);
        }
        parts.sort_by_key(|e| e.time_frame.start);

        let mergeable = parts.windows(2).all(|pair| {
            pair[0].time_frame.is_followed_by(pair[1].time_frame)
                && pair[0].element_type() == pair[1].element_type()
        });
        if !mergeable {
            debug!(count = parts.len(), "Merge rejected: elements not contiguous");
            return None;
        }

        let first = parts[0];
        let last = parts[parts.len() - 1];
        let mut merged = first.derive(MERGED_SUFFIX);
        merged.time_frame = TimeFrame::new(first.time_frame.start, last.time_frame.end);
        let merged_id = merged.id;

        let remaining = self.elements().len() - parts.len();
        let mut commands: Vec<EditCommand> = parts
            .iter()
            .map(|e| EditCommand::Remove {
                timeline_id,
                element_id: e.id,
                removed: None,
            })
            .collect();
        commands.push(EditCommand::Insert {
            timeline_id,
            index: remaining,
            element: merged,
        });
        debug!(merged = %merged_id, parts = unique.len(), "Merging elements");

        let cmd = execute(self, EditCommand::Batch(commands))?;
        self.select(Some(merged_id));
        Some(cmd)
    }

    /// Shift every element after `pivot` (in sequence order) by `delta`.
    ///
    /// Each element goes through the clamped time-frame update independently.
    pub fn ripple_timeline_changes(&mut self, pivot: Uuid, delta: Millis) -> Option<EditCommand> {
        if delta == 0 {
            return None;
        }
        let timeline = self.active()?;
        let index = timeline.position(pivot)?;
        let following: Vec<(Uuid, TimeFrame)> = timeline.elements[index + 1..]
            .iter()
            .map(|e| (e.id, e.time_frame))
            .collect();

        let commands: Vec<EditCommand> = following
            .into_iter()
            .filter_map(|(id, tf)| self.update_element_time_frame(id, tf.shifted(delta)))
            .collect();
        if commands.is_empty() {
            return None;
        }
        debug!(pivot = %pivot, delta, moved = commands.len(), "Rippled timeline");
        Some(EditCommand::Batch(commands))
    }

    /// Reset a video element to cover its whole source.
    pub fn uncut_element(&mut self, id: Uuid, source_duration: Millis) -> Option<EditCommand> {
        let element = self.element(id)?;
        if !matches!(element.kind, ElementKind::Video { .. }) {
            return None;
        }
        self.update_element_time_frame(id, TimeFramePatch::both(0, source_duration))
    }

    /// Set the visual effect of a video or image element.
    pub fn set_effect(&mut self, id: Uuid, effect: Effect) -> Option<EditCommand> {
        let timeline_id = self.active_id()?;
        let before = self.element(id)?.kind.clone();
        let after = match &before {
            ElementKind::Video { source, .. } => ElementKind::Video {
                source: source.clone(),
                effect,
            },
            ElementKind::Image { source, .. } => ElementKind::Image {
                source: source.clone(),
                effect,
            },
            ElementKind::Audio { .. } | ElementKind::Text(_) => return None,
        };
        if after == before {
            return None;
        }
        execute(
            self,
            EditCommand::SetKind {
                timeline_id,
                element_id: id,
                before,
                after,
            },
        )
    }

    /// Replace the text content of a text element.
    pub fn update_text(&mut self, id: Uuid, text: impl Into<String>) -> Option<EditCommand> {
        let timeline_id = self.active_id()?;
        let before = self.element(id)?.kind.clone();
        let ElementKind::Text(props) = &before else {
            return None;
        };
        let text = text.into();
        if props.text == text {
            return None;
        }
        let mut props = props.clone();
        props.text = text;
        execute(
            self,
            EditCommand::SetKind {
                timeline_id,
                element_id: id,
                before,
                after: ElementKind::Text(props),
            },
        )
    }

    /// Replace an element's placement.
    pub fn update_placement(&mut self, id: Uuid, placement: Placement) -> Option<EditCommand> {
        let timeline_id = self.active_id()?;
        let before = self.element(id)?.placement;
        if before == placement {
            return None;
        }
        execute(
            self,
            EditCommand::SetPlacement {
                timeline_id,
                element_id: id,
                before,
                after: placement,
            },
        )
    }

    /// Swap an element for `replacement` at the same position.
    ///
    /// The selection follows if the replaced element was selected.
    pub fn replace_element(
        &mut self,
        id: Uuid,
        replacement: EditorElement,
    ) -> Option<EditCommand> {
        let timeline_id = self.active_id()?;
        let index = self.active()?.position(id)?;
        if replacement.id != id && self.contains_anywhere(replacement.id) {
            return None;
        }
        let was_selected = self.selected() == Some(id);
        let replacement_id = replacement.id;
        let cmd = execute(
            self,
            EditCommand::Batch(vec![
                EditCommand::Remove {
                    timeline_id,
                    element_id: id,
                    removed: None,
                },
                EditCommand::Insert {
                    timeline_id,
                    index,
                    element: replacement,
                },
            ]),
        )?;
        if was_selected {
            self.select(Some(replacement_id));
        }
        Some(cmd)
    }
}

// ── Undo history ────────────────────────────────────────────────

/// An executed edit together with the selection on either side of it.
#[derive(Debug, Clone)]
struct HistoryEntry {
    command: EditCommand,
    selected_before: Option<Uuid>,
    selected_after: Option<Uuid>,
}

/// A command popped off the history, with the selection to restore once it
/// has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStep {
    pub command: EditCommand,
    pub select: Option<Uuid>,
}

impl HistoryStep {
    /// Apply the command, then restore the selection.
    pub fn apply(mut self, registry: &mut TimelineRegistry) {
        self.command.apply(registry);
        registry.select(self.select);
    }
}

/// Bounded undo/redo history.
///
/// Recording a new edit drops the redo branch; past `depth` entries the
/// oldest edit is forgotten. Empty batches are never recorded.
#[derive(Debug)]
pub struct UndoStack {
    done: VecDeque<HistoryEntry>,
    undone: Vec<HistoryEntry>,
    depth: usize,
}

impl UndoStack {
    pub fn new(depth: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            depth,
        }
    }

    /// Record an already-applied edit and the selection before and after it.
    ///
    /// Returns false when the command changes nothing and was skipped.
    pub fn record(
        &mut self,
        command: EditCommand,
        selected_before: Option<Uuid>,
        selected_after: Option<Uuid>,
    ) -> bool {
        if command.is_empty() {
            return false;
        }
        self.undone.clear();
        self.done.push_back(HistoryEntry {
            command,
            selected_before,
            selected_after,
        });
        while self.done.len() > self.depth {
            self.done.pop_front();
        }
        true
    }

    /// The inverse of the latest edit, restoring the selection it replaced.
    pub fn undo(&mut self) -> Option<HistoryStep> {
        let entry = self.done.pop_back()?;
        let step = HistoryStep {
            command: entry.command.inverse(),
            select: entry.selected_before,
        };
        self.undone.push(entry);
        Some(step)
    }

    /// The latest undone edit, restoring the selection it produced.
    pub fn redo(&mut self) -> Option<HistoryStep> {
        let entry = self.undone.pop()?;
        let step = HistoryStep {
            command: entry.command.clone(),
            select: entry.selected_after,
        };
        self.done.push_back(entry);
        Some(step)
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }

    /// Edits available to undo.
    pub fn undo_len(&self) -> usize {
        self.done.len()
    }

    /// Edits available to redo.
    pub fn redo_len(&self) -> usize {
        self.undone.len()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(200)
    }
}

// ── Tests ───────────────────────────────────────────────────────
