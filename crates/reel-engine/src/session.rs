//! Editor session: the single owner of all editing state.
//!
//! Every mutating call follows the same pipeline: run the edit, record it for
//! undo, recompile the animation schedule, reconcile the render surface,
//! resync the playback bounds and push the current frame. Asynchronous
//! collaborators never hold the session across an await inside its own
//! methods; their results come back through ticket-validated calls.

use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};
use reel_ai::{group_by_name, name_groups, NamingService, VideoGroup, TOPIC_FALLBACK};
use reel_core::{Millis, Placement, Result, TimeFrame, TimeFramePatch};
use reel_media::{probe_or_fallback, ExportJob, MediaInfo, Prober, SolidFrames, TrimJob};
use reel_timeline::{
    Animation, EditCommand, EditorElement, Effect, ElementKind, ElementType, MediaSource, Project,
    TextProps, TimelineRegistry, UndoStack, TRIMMED_SUFFIX,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::animation::{compile, Schedule};
use crate::config::EngineConfig;
use crate::library::{MediaLibrary, MediaResource, ResourceKind, SortKey, SortOrder};
use crate::playback::{PlaybackClock, SystemClock, WallClock};
use crate::sync::{self, RenderSurface, SurfaceEvent};

/// A planned grouping of the library's videos, waiting for names.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingTicket {
    /// Library generation the groups were computed from.
    pub generation: u64,
    /// File names per group, in group order.
    pub groups: Vec<Vec<String>>,
}

/// A trim in flight for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimTicket {
    pub element_id: Uuid,
    /// Element revision when the trim was planned.
    pub revision: u64,
    pub job: TrimJob,
}

/// Editing state of one open project.
pub struct EditorSession<S: RenderSurface> {
    config: EngineConfig,
    name: String,
    registry: TimelineRegistry,
    animations: Vec<Animation>,
    schedule: Schedule,
    clock: PlaybackClock,
    wall: Box<dyn WallClock>,
    surface: S,
    history: UndoStack,
    library: MediaLibrary,
    video_groups: Vec<VideoGroup>,
    background: String,
    events_tx: Sender<SurfaceEvent>,
    events_rx: Receiver<SurfaceEvent>,
}

impl<S: RenderSurface> EditorSession<S> {
    /// Open an empty session on the system clock.
    pub fn new(config: EngineConfig, surface: S) -> Self {
        Self::with_clock(config, surface, Box::new(SystemClock::new()))
    }

    /// Open an empty session driven by `wall`.
    pub fn with_clock(config: EngineConfig, mut surface: S, wall: Box<dyn WallClock>) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let background = config.background_color.clone();
        surface.set_background(&background);
        info!(
            fps = %config.frame_rate,
            width = config.canvas.width,
            height = config.canvas.height,
            "Editor session opened"
        );
        Self {
            clock: PlaybackClock::new(config.frame_rate, 0),
            history: UndoStack::new(config.undo_depth),
            name: "Untitled".to_string(),
            registry: TimelineRegistry::new(),
            animations: Vec::new(),
            schedule: Schedule::new(),
            wall,
            surface,
            library: MediaLibrary::new(),
            video_groups: Vec::new(),
            background,
            events_tx,
            events_rx,
            config,
        }
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &TimelineRegistry {
        &self.registry
    }

    /// Elements of the active timeline.
    pub fn elements(&self) -> &[EditorElement] {
        self.registry.elements()
    }

    pub fn element(&self, id: Uuid) -> Option<&EditorElement> {
        self.registry.element(id)
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn library(&self) -> &MediaLibrary {
        &self.library
    }

    pub fn video_groups(&self) -> &[VideoGroup] {
        &self.video_groups
    }

    pub fn background_color(&self) -> &str {
        &self.background
    }

    pub fn current_time_ms(&self) -> f64 {
        self.clock.current_time_ms()
    }

    pub fn max_time(&self) -> Millis {
        self.registry.max_time()
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.registry.selected()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Pipeline ───────────────────────────────────────────────

    /// Recompile, reconcile and resync after a structural change.
    fn refresh(&mut self) -> Result<()> {
        self.schedule = compile(&self.animations, self.registry.elements(), self.surface.canvas());
        sync::reconcile(&mut self.surface, &mut self.registry, &self.schedule)?;
        self.clock.set_max_time(self.registry.max_time());
        self.sync_frame();
        Ok(())
    }

    fn sync_frame(&mut self) {
        let t = self.clock.current_time_ms();
        sync::sync_frame(&mut self.surface, self.registry.elements(), &self.schedule, t);
    }

    fn sync_media(&mut self) {
        let t = self.clock.current_time_ms();
        let playing = self.clock.is_playing();
        sync::sync_media(&mut self.surface, self.registry.elements(), t, playing);
    }

    /// Run a registry edit, record it with the selection around it and
    /// refresh. `None` from the edit means nothing happened.
    fn edit(
        &mut self,
        op: impl FnOnce(&mut TimelineRegistry) -> Option<EditCommand>,
    ) -> Result<bool> {
        let selected_before = self.registry.selected();
        let Some(command) = op(&mut self.registry) else {
            return Ok(false);
        };
        self.history
            .record(command, selected_before, self.registry.selected());
        self.refresh()?;
        Ok(true)
    }

    // ── Timelines ──────────────────────────────────────────────

    /// Append a timeline; it becomes active if none was.
    pub fn create_timeline(&mut self, name: impl Into<String>) -> Result<Uuid> {
        let had_active = self.registry.active_id().is_some();
        let id = self.registry.create_timeline(name);
        if !had_active {
            self.refresh()?;
        }
        Ok(id)
    }

    /// Switch the visible timeline. Unknown ids are ignored.
    pub fn set_active_timeline(&mut self, id: Uuid) -> Result<bool> {
        if self.registry.timeline(id).is_none() || self.registry.active_id() == Some(id) {
            return Ok(false);
        }
        sync::release_visuals(&mut self.surface, &mut self.registry);
        self.registry.set_active_timeline(id);
        debug!(timeline = %id, "Active timeline changed");
        self.refresh()?;
        self.sync_media();
        Ok(true)
    }

    // ── Media library ──────────────────────────────────────────

    /// Probe a file and add it to the library.
    pub fn import_file(&mut self, kind: ResourceKind, path: &Path, prober: &dyn Prober) -> Uuid {
        let info = probe_or_fallback(prober, path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        self.import_resource(kind, path.to_string_lossy(), file_name, info)
    }

    /// Add already-probed media to the library.
    pub fn import_resource(
        &mut self,
        kind: ResourceKind,
        url: impl Into<String>,
        file_name: impl Into<String>,
        info: MediaInfo,
    ) -> Uuid {
        self.library.add(MediaResource::new(kind, url, file_name, info))
    }

    pub fn remove_resource(&mut self, id: Uuid) -> bool {
        self.library.remove(id).is_some()
    }

    pub fn sort_resources(&mut self, kind: ResourceKind, key: SortKey, order: SortOrder) {
        self.library.sort(kind, key, order);
    }

    // ── Adding and removing elements ───────────────────────────

    fn resource_of(&self, id: Uuid, kind: ResourceKind) -> Option<MediaResource> {
        self.library.get(id).filter(|r| r.kind == kind).cloned()
    }

    fn source_of(resource: &MediaResource) -> MediaSource {
        MediaSource {
            url: resource.url.clone(),
            resource_id: Some(resource.id),
        }
    }

    /// Place a video from the library at `[0, duration]`.
    ///
    /// Videos without a known duration cannot be placed.
    pub fn add_video_from_resource(&mut self, resource_id: Uuid) -> Result<Option<Uuid>> {
        let Some(resource) = self.resource_of(resource_id, ResourceKind::Video) else {
            return Ok(None);
        };
        let Some(duration) = resource.info.duration_ms else {
            warn!(file = %resource.file_name, "Video has no known duration; not placed");
            return Ok(None);
        };
        let mut element = EditorElement::video(
            resource.file_name.clone(),
            Self::source_of(&resource),
            TimeFrame::new(0, duration),
        );
        element.placement = Placement::from_aspect_ratio(resource.info.aspect_ratio().unwrap_or(1.0));
        self.add_element(element)
    }

    /// Place an image from the library across the whole timeline.
    pub fn add_image_from_resource(&mut self, resource_id: Uuid) -> Result<Option<Uuid>> {
        let Some(resource) = self.resource_of(resource_id, ResourceKind::Image) else {
            return Ok(None);
        };
        let mut element = EditorElement::image(
            resource.file_name.clone(),
            Self::source_of(&resource),
            TimeFrame::new(0, self.registry.max_time()),
        );
        element.placement = Placement::from_aspect_ratio(resource.info.aspect_ratio().unwrap_or(1.0));
        self.add_element(element)
    }

    /// Place an audio track from the library at `[0, duration]`.
    pub fn add_audio_from_resource(&mut self, resource_id: Uuid) -> Result<Option<Uuid>> {
        let Some(resource) = self.resource_of(resource_id, ResourceKind::Audio) else {
            return Ok(None);
        };
        let duration = resource.info.duration_ms.unwrap_or(0);
        let element = EditorElement::audio(
            resource.file_name.clone(),
            Self::source_of(&resource),
            TimeFrame::new(0, duration),
        );
        self.add_element(element)
    }

    /// Add a text element across the whole timeline.
    pub fn add_text(
        &mut self,
        text: impl Into<String>,
        font_size: f32,
        font_weight: u16,
    ) -> Result<Option<Uuid>> {
        let props = TextProps {
            text: text.into(),
            font_size,
            font_weight,
        };
        let name = format!("Text {}", self.registry.elements().len() + 1);
        let element = EditorElement::text(name, props, TimeFrame::new(0, self.registry.max_time()));
        self.add_element(element)
    }

    /// Append an element to the active timeline and select it.
    pub fn add_element(&mut self, element: EditorElement) -> Result<Option<Uuid>> {
        let id = element.id;
        Ok(self.edit(|r| r.add_element(element))?.then_some(id))
    }

    pub fn remove_element(&mut self, id: Uuid) -> Result<bool> {
        self.edit(|r| r.remove_element(id))
    }

    /// Select an element of the active timeline, or clear the selection.
    pub fn select(&mut self, id: Option<Uuid>) -> bool {
        let changed = self.registry.select(id);
        if changed {
            let handle = self.registry.selected_element().and_then(|e| e.visual);
            self.surface.set_active(handle);
        }
        changed
    }

    // ── Edits ──────────────────────────────────────────────────

    pub fn update_time_frame(&mut self, id: Uuid, patch: TimeFramePatch) -> Result<bool> {
        let changed = self.edit(|r| r.update_element_time_frame(id, patch))?;
        if changed {
            self.sync_media();
        }
        Ok(changed)
    }

    pub fn split_element_at_time(&mut self, id: Uuid, time: Millis) -> Result<bool> {
        self.edit(|r| r.split_element_at_time(id, time))
    }

    /// Merge contiguous elements; returns the merged element's id.
    pub fn merge_elements(&mut self, ids: &[Uuid]) -> Result<Option<Uuid>> {
        let merged = self.edit(|r| r.merge_elements(ids))?;
        Ok(if merged { self.registry.selected() } else { None })
    }

    pub fn ripple_timeline_changes(&mut self, pivot: Uuid, delta: Millis) -> Result<bool> {
        self.edit(|r| r.ripple_timeline_changes(pivot, delta))
    }

    /// Snap to the nearest element edge within the configured threshold.
    pub fn snap_to_nearest_clip(&self, time: Millis) -> Millis {
        self.registry
            .snap_to_nearest_clip(time, self.config.snap_threshold_ms)
    }

    /// Snap while dragging `dragged`, ignoring its own edges.
    pub fn snap_dragged(&self, dragged: Uuid, time: Millis) -> Millis {
        self.registry
            .snap_excluding(time, self.config.snap_threshold_ms, dragged)
    }

    pub fn set_effect(&mut self, id: Uuid, effect: Effect) -> Result<bool> {
        self.edit(|r| r.set_effect(id, effect))
    }

    pub fn update_placement(&mut self, id: Uuid, placement: Placement) -> Result<bool> {
        self.edit(|r| r.update_placement(id, placement))
    }

    pub fn update_text(&mut self, id: Uuid, text: impl Into<String>) -> Result<bool> {
        self.edit(|r| r.update_text(id, text))
    }

    /// Reset a video to its whole source, as far as the time bound allows.
    pub fn uncut_element(&mut self, id: Uuid) -> Result<bool> {
        let Some(duration) = self.source_duration(id) else {
            return Ok(false);
        };
        self.edit(|r| r.uncut_element(id, duration))
    }

    fn source_duration(&self, id: Uuid) -> Option<Millis> {
        let element = self.registry.element(id)?;
        let resource_id = element.kind.source()?.resource_id?;
        self.library.get(resource_id)?.info.duration_ms
    }

    pub fn undo(&mut self) -> Result<bool> {
        let Some(step) = self.history.undo() else {
            return Ok(false);
        };
        step.apply(&mut self.registry);
        debug!("Undo");
        self.refresh()?;
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let Some(step) = self.history.redo() else {
            return Ok(false);
        };
        step.apply(&mut self.registry);
        debug!("Redo");
        self.refresh()?;
        Ok(true)
    }

    // ── Animations ─────────────────────────────────────────────

    pub fn add_animation(&mut self, animation: Animation) -> Result<Uuid> {
        let id = animation.id;
        self.animations.push(animation);
        self.refresh()?;
        Ok(id)
    }

    /// Replace an animation, keeping its id.
    pub fn update_animation(&mut self, id: Uuid, animation: Animation) -> Result<bool> {
        let Some(slot) = self.animations.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        *slot = Animation { id, ..animation };
        self.refresh()?;
        Ok(true)
    }

    pub fn remove_animation(&mut self, id: Uuid) -> Result<bool> {
        let before = self.animations.len();
        self.animations.retain(|a| a.id != id);
        if self.animations.len() == before {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    // ── Playback ───────────────────────────────────────────────

    pub fn play(&mut self) {
        let now = self.wall.now();
        self.clock.play(now);
        self.sync_media();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
        self.sync_media();
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Advance the playhead to the current wall time.
    pub fn tick(&mut self) -> bool {
        let now = self.wall.now();
        let previous = self.clock.frame_index();
        let moved = self.clock.tick(now);
        if moved {
            if self.clock.frame_index() < previous {
                // Looped back to the start; media must jump too.
                self.sync_media();
            }
            self.sync_frame();
        }
        moved
    }

    /// Stop playback and jump to `time_ms`. Out-of-range times are ignored.
    pub fn seek(&mut self, time_ms: Millis) -> bool {
        if !self.clock.seek(time_ms) {
            return false;
        }
        self.sync_frame();
        self.sync_media();
        true
    }

    /// Set the time bound; it never drops below the latest element end.
    pub fn set_max_time(&mut self, max_time: Millis) {
        self.registry.set_max_time(max_time);
        self.clock.set_max_time(self.registry.max_time());
        self.sync_frame();
    }

    pub fn set_background_color(&mut self, color: impl Into<String>) {
        self.background = color.into();
        self.surface.set_background(&self.background);
    }

    // ── Surface events ─────────────────────────────────────────

    /// Sender the surface reports gestures through.
    pub fn event_sender(&self) -> Sender<SurfaceEvent> {
        self.events_tx.clone()
    }

    /// Fold queued surface gestures into the model. Returns how many were handled.
    pub fn pump_surface_events(&mut self) -> Result<usize> {
        let events: Vec<SurfaceEvent> = self.events_rx.try_iter().collect();
        let count = events.len();
        for event in events {
            match event {
                SurfaceEvent::Modified {
                    element_id,
                    placement,
                    text,
                } => {
                    self.edit(|registry| {
                        let mut commands = Vec::new();
                        commands.extend(registry.update_placement(element_id, placement));
                        if let Some(text) = text {
                            commands.extend(registry.update_text(element_id, text));
                        }
                        (!commands.is_empty()).then(|| EditCommand::Batch(commands))
                    })?;
                }
                SurfaceEvent::Selected(id) => {
                    self.select(Some(id));
                }
                SurfaceEvent::Cleared => {
                    self.select(None);
                }
            }
        }
        Ok(count)
    }

    // ── Grouping and topic sorting ─────────────────────────────

    /// Group the library's videos by file name, to be named asynchronously.
    pub fn plan_video_groups(&self) -> GroupingTicket {
        let names: Vec<String> = self
            .library
            .of_kind(ResourceKind::Video)
            .map(|r| r.file_name.clone())
            .collect();
        GroupingTicket {
            generation: self.library.generation(),
            groups: group_by_name(&names),
        }
    }

    /// Store named groups. Tickets from an older library state are discarded.
    pub fn apply_video_groups(&mut self, ticket: GroupingTicket, names: Vec<String>) -> bool {
        if ticket.generation != self.library.generation() || names.len() != ticket.groups.len() {
            debug!(
                ticket = ticket.generation,
                current = self.library.generation(),
                "Discarding stale grouping result"
            );
            return false;
        }
        self.video_groups = ticket
            .groups
            .into_iter()
            .zip(names)
            .map(|(videos, name)| VideoGroup::new(name, videos))
            .collect();
        true
    }

    /// Source URL of every video element of the active timeline.
    pub fn video_clip_sources(&self) -> Vec<(Uuid, String)> {
        self.registry
            .elements()
            .iter()
            .filter_map(|e| match &e.kind {
                ElementKind::Video { source, .. } => Some((e.id, source.url.clone())),
                _ => None,
            })
            .collect()
    }

    /// Reorder the active timeline so videos sharing a topic are adjacent.
    ///
    /// Topics keep the order they are first seen in; videos without a topic
    /// and all other elements follow in their current order.
    pub fn sort_clips_by_topic(&mut self, topics: &[(Uuid, String)]) -> Result<bool> {
        let mut groups: Vec<(&str, Vec<Uuid>)> = Vec::new();
        let mut rest = Vec::new();
        for element in self.registry.elements() {
            let topic = (element.element_type() == ElementType::Video)
                .then(|| topics.iter().find(|(id, _)| *id == element.id))
                .flatten();
            match topic {
                Some((_, topic)) => match groups.iter_mut().find(|(t, _)| *t == topic.as_str()) {
                    Some((_, ids)) => ids.push(element.id),
                    None => groups.push((topic.as_str(), vec![element.id])),
                },
                None => rest.push(element.id),
            }
        }
        let order: Vec<Uuid> = groups
            .into_iter()
            .flat_map(|(_, ids)| ids)
            .chain(rest)
            .collect();
        if order.iter().eq(self.registry.elements().iter().map(|e| &e.id)) {
            return Ok(false);
        }
        if !self.registry.reorder_elements(&order) {
            return Ok(false);
        }
        // Reordering is not undoable; older entries may refer to stale indices.
        self.history.clear();
        self.refresh()?;
        Ok(true)
    }

    // ── Trim ───────────────────────────────────────────────────

    /// Plan a stream-copy trim of a video element's visible range.
    pub fn begin_trim(&self, id: Uuid, output: impl Into<PathBuf>) -> Option<TrimTicket> {
        let element = self.registry.element(id)?;
        let ElementKind::Video { source, .. } = &element.kind else {
            return None;
        };
        let tf = element.time_frame;
        Some(TrimTicket {
            element_id: id,
            revision: element.revision,
            job: TrimJob::new(&source.url, tf.start, tf.end, output),
        })
    }

    /// Swap in the trimmed media. Returns the new element's id, or `None` if
    /// the element was removed or edited since the trim was planned.
    pub fn complete_trim(&mut self, ticket: TrimTicket, url: impl Into<String>) -> Result<Option<Uuid>> {
        let Some(element) = self.registry.element(ticket.element_id) else {
            debug!(element = %ticket.element_id, "Trimmed element no longer exists");
            return Ok(None);
        };
        if element.revision != ticket.revision {
            debug!(element = %ticket.element_id, "Discarding trim of an edited element");
            return Ok(None);
        }
        let mut trimmed = element.derive(TRIMMED_SUFFIX);
        if let ElementKind::Video { source, .. } = &mut trimmed.kind {
            *source = MediaSource::new(url);
        }
        let new_id = trimmed.id;
        let replaced = self.edit(|r| r.replace_element(ticket.element_id, trimmed))?;
        Ok(replaced.then_some(new_id))
    }

    // ── Export ─────────────────────────────────────────────────

    /// Export job covering the whole timeline, mixing in every audio element.
    pub fn export_job(&self, output: impl Into<PathBuf>) -> ExportJob {
        let mut job = ExportJob::new(
            output,
            self.config.export_container,
            self.surface.canvas(),
            self.registry.max_time(),
        );
        job.frame_rate = self.config.export_frame_rate;
        for element in self.registry.elements() {
            if let ElementKind::Audio { source } = &element.kind {
                job = job.with_audio(&source.url, element.time_frame.start);
            }
        }
        job
    }

    /// Frames for the export: every frame is the solid canvas background.
    ///
    /// Element pixels are not composited; only audio elements reach the
    /// encoded file, through the job's mix.
    pub fn export_frames(&self) -> Result<SolidFrames> {
        SolidFrames::from_hex(&self.background)
    }

    // ── Projects ───────────────────────────────────────────────

    /// Snapshot the persisted state.
    pub fn to_project(&self) -> Project {
        let mut registry = self.registry.clone();
        registry.detach_visuals();
        Project {
            name: self.name.clone(),
            registry,
            animations: self.animations.clone(),
            background_color: self.background.clone(),
        }
    }

    /// Replace the editing state with a loaded project.
    pub fn load_project(&mut self, project: Project) -> Result<()> {
        sync::release_visuals(&mut self.surface, &mut self.registry);
        self.clock.pause();
        self.name = project.name;
        self.registry = project.registry;
        self.registry.normalize();
        self.registry.detach_visuals();
        let bound = self.registry.max_time();
        self.registry.set_max_time(bound);
        self.animations = project.animations;
        self.history.clear();
        self.set_background_color(project.background_color);
        self.clock.seek(0);
        info!(project = %self.name, elements = self.registry.elements().len(), "Project loaded");
        self.refresh()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release every surface object and the library's object URLs.
    ///
    /// Returns the URLs the host must revoke.
    pub fn shutdown(&mut self) -> Vec<String> {
        self.clock.pause();
        sync::release_visuals(&mut self.surface, &mut self.registry);
        let released = self.library.cleanup();
        info!(released = released.len(), "Editor session closed");
        released
    }
}

// ── Asynchronous helpers ────────────────────────────────────────

/// Group the library's videos and name every group.
///
/// Returns whether the result was stored; it is dropped if the library
/// changed while naming.
pub async fn group_videos<S, N>(session: &mut EditorSession<S>, naming: &N) -> bool
where
    S: RenderSurface,
    N: NamingService + ?Sized,
{
    let ticket = session.plan_video_groups();
    let names = name_groups(naming, &ticket.groups).await;
    session.apply_video_groups(ticket, names)
}

/// Ask for a topic per video clip and reorder the timeline by topic.
pub async fn sort_clips_by_topic<S, N>(session: &mut EditorSession<S>, naming: &N) -> Result<bool>
where
    S: RenderSurface,
    N: NamingService + ?Sized,
{
    let mut topics = Vec::new();
    for (id, url) in session.video_clip_sources() {
        let topic = match naming.name_group(std::slice::from_ref(&url)).await {
            Ok(topic) if !topic.trim().is_empty() => topic.trim().to_string(),
            Ok(_) => TOPIC_FALLBACK.to_string(),
            Err(e) => {
                warn!(error = %e, clip = %url, "Topic lookup failed");
                TOPIC_FALLBACK.to_string()
            }
        };
        topics.push((id, topic));
    }
    session.sort_clips_by_topic(&topics)
}
