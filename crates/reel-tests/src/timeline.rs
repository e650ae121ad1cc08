//! Integration tests for the timeline subsystem.
//!
//! Exercises cross-crate interactions between reel-core,
//! reel-timeline, and reel-media.

use reel_core::{CanvasBounds, FrameRate, TimeFrame, TimeFramePatch};
use reel_media::{Container, ExportJob};
use reel_timeline::{
    Animation, AnimationKind, EditCommand, EditorElement, ElementType, MediaSource, Project,
    ProjectFile, TimelineRegistry, UndoStack, MERGED_SUFFIX, SPLIT_SUFFIX,
};
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

fn video(name: &str, start: i64, end: i64) -> EditorElement {
    EditorElement::video(
        name,
        MediaSource::new(format!("media/{name}.mp4")),
        TimeFrame::new(start, end),
    )
}

struct Fixture {
    registry: TimelineRegistry,
    intro: Uuid,
    body: Uuid,
    outro: Uuid,
    music: Uuid,
}

fn build_registry() -> Fixture {
    let mut registry = TimelineRegistry::new();
    let intro = video("Intro", 0, 1000);
    let body = video("Body", 1000, 3000);
    let outro = video("Outro", 3000, 4500);
    let music = EditorElement::audio(
        "Music",
        MediaSource::new("media/music.mp3"),
        TimeFrame::new(0, 4500),
    );
    let ids = (intro.id, body.id, outro.id, music.id);
    for element in [intro, body, outro, music] {
        assert!(registry.add_element(element).is_some());
    }
    Fixture {
        registry,
        intro: ids.0,
        body: ids.1,
        outro: ids.2,
        music: ids.3,
    }
}

fn names(registry: &TimelineRegistry) -> Vec<String> {
    registry.elements().iter().map(|e| e.name.clone()).collect()
}

// ── Registry assembly & timing ─────────────────────────────────

#[test]
fn max_time_covers_every_element() {
    let f = build_registry();
    assert_eq!(f.registry.max_time(), 4500);
    assert_eq!(f.registry.timelines().len(), 1);
    assert_eq!(f.registry.elements().len(), 4);
    // The last added element is selected.
    assert_eq!(f.registry.selected(), Some(f.music));
}

#[test]
fn set_max_time_never_cuts_elements() {
    let mut f = build_registry();
    f.registry.set_max_time(2000);
    assert_eq!(f.registry.max_time(), 4500);
    f.registry.set_max_time(9000);
    assert_eq!(f.registry.max_time(), 9000);
    assert_eq!(f.registry.active().unwrap().duration, 9000);
}

#[test]
fn elements_stay_in_their_own_timeline() {
    let mut f = build_registry();
    let first = f.registry.active_id().unwrap();
    let second = f.registry.create_timeline("B-roll");
    assert!(f.registry.set_active_timeline(second));
    assert!(f.registry.elements().is_empty());
    assert_eq!(f.registry.selected(), None);

    f.registry.add_element(video("Cutaway", 0, 500));
    assert!(f.registry.set_active_timeline(first));
    assert_eq!(f.registry.elements().len(), 4);
    assert!(f.registry.element(f.intro).is_some());
}

// ── Edit operations with undo ──────────────────────────────────

#[test]
fn split_and_undo_restores_element() {
    let mut f = build_registry();
    let mut undo = UndoStack::new(100);

    let before = f.registry.selected();
    let cmd = f.registry.split_element_at_time(f.body, 2000).unwrap();
    undo.record(cmd, before, f.registry.selected());

    assert_eq!(
        names(&f.registry),
        ["Intro", "Body", "Body (split)", "Outro", "Music"]
    );
    let body = f.registry.element(f.body).unwrap();
    assert_eq!(body.time_frame, TimeFrame::new(1000, 2000));
    let right = &f.registry.elements()[2];
    assert_eq!(right.time_frame, TimeFrame::new(2000, 3000));
    assert_eq!(right.origin_id, body.origin_id);
    assert!(right.name.ends_with(SPLIT_SUFFIX));

    undo.undo().unwrap().apply(&mut f.registry);
    assert_eq!(names(&f.registry), ["Intro", "Body", "Outro", "Music"]);
    assert_eq!(
        f.registry.element(f.body).unwrap().time_frame,
        TimeFrame::new(1000, 3000)
    );
}

#[test]
fn split_at_edges_is_a_noop() {
    let mut f = build_registry();
    assert!(f.registry.split_element_at_time(f.body, 1000).is_none());
    assert!(f.registry.split_element_at_time(f.body, 3000).is_none());
    assert!(f.registry.split_element_at_time(Uuid::new_v4(), 2000).is_none());
    assert_eq!(f.registry.elements().len(), 4);
}

#[test]
fn merge_contiguous_videos() {
    let mut f = build_registry();
    let mut undo = UndoStack::new(100);
    let origin = f.registry.element(f.intro).unwrap().origin_id;

    let before = f.registry.selected();
    let cmd = f.registry.merge_elements(&[f.body, f.intro]).unwrap();
    undo.record(cmd, before, f.registry.selected());

    assert_eq!(names(&f.registry), ["Outro", "Music", "Intro (merged)"]);
    let merged = f.registry.elements().last().unwrap();
    assert_eq!(merged.time_frame, TimeFrame::new(0, 3000));
    assert_eq!(merged.origin_id, origin);
    assert!(merged.name.ends_with(MERGED_SUFFIX));
    assert_eq!(f.registry.selected(), Some(merged.id));

    undo.undo().unwrap().apply(&mut f.registry);
    assert_eq!(names(&f.registry), ["Intro", "Body", "Outro", "Music"]);
    assert_eq!(f.registry.selected(), Some(f.music));

    undo.redo().unwrap().apply(&mut f.registry);
    assert_eq!(f.registry.elements().len(), 3);
    assert_eq!(f.registry.selected(), Some(f.registry.elements()[2].id));
}

#[test]
fn merge_rejects_gaps_mixed_types_and_single_ids() {
    let mut f = build_registry();
    assert!(f.registry.merge_elements(&[f.intro, f.outro]).is_none());
    assert!(f.registry.merge_elements(&[f.intro, f.music]).is_none());
    assert!(f.registry.merge_elements(&[f.intro, f.intro]).is_none());
    assert!(f.registry.merge_elements(&[f.intro, Uuid::new_v4()]).is_none());
    assert_eq!(f.registry.elements().len(), 4);
}

#[test]
fn ripple_shifts_following_elements_within_bounds() {
    let mut f = build_registry();
    let cmd = f.registry.ripple_timeline_changes(f.intro, 500).unwrap();

    assert_eq!(
        f.registry.element(f.body).unwrap().time_frame,
        TimeFrame::new(1500, 3500)
    );
    // Ends are clamped by the time bound.
    assert_eq!(
        f.registry.element(f.outro).unwrap().time_frame,
        TimeFrame::new(3500, 4500)
    );
    assert_eq!(
        f.registry.element(f.music).unwrap().time_frame,
        TimeFrame::new(500, 4500)
    );
    assert_eq!(
        f.registry.element(f.intro).unwrap().time_frame,
        TimeFrame::new(0, 1000)
    );

    let mut inverse = cmd.inverse();
    inverse.apply(&mut f.registry);
    assert_eq!(
        f.registry.element(f.outro).unwrap().time_frame,
        TimeFrame::new(3000, 4500)
    );
}

#[test]
fn time_frame_patch_is_clamped() {
    let mut f = build_registry();
    f.registry
        .update_element_time_frame(f.intro, TimeFramePatch::both(-300, 9000))
        .unwrap();
    assert_eq!(
        f.registry.element(f.intro).unwrap().time_frame,
        TimeFrame::new(0, 4500)
    );

    f.registry
        .update_element_time_frame(f.intro, TimeFramePatch::end(-5))
        .unwrap();
    assert_eq!(
        f.registry.element(f.intro).unwrap().time_frame,
        TimeFrame::new(0, 0)
    );
    // Unchanged patches produce no command.
    assert!(f
        .registry
        .update_element_time_frame(f.intro, TimeFramePatch::start(0))
        .is_none());
}

#[test]
fn batch_inverse_reverses_in_order() {
    let mut f = build_registry();
    let timeline_id = f.registry.active_id().unwrap();
    let extra = video("Extra", 0, 200);
    let extra_id = extra.id;

    let mut batch = EditCommand::Batch(vec![
        EditCommand::Insert {
            timeline_id,
            index: 0,
            element: extra,
        },
        EditCommand::Remove {
            timeline_id,
            element_id: f.outro,
            removed: None,
        },
    ]);
    batch.apply(&mut f.registry);
    assert_eq!(f.registry.elements()[0].id, extra_id);
    assert!(f.registry.element(f.outro).is_none());

    let mut inverse = batch.inverse();
    inverse.apply(&mut f.registry);
    assert_eq!(names(&f.registry), ["Intro", "Body", "Outro", "Music"]);
}

// ── Snapping ───────────────────────────────────────────────────

#[test]
fn snapping_uses_strict_threshold() {
    let f = build_registry();
    assert_eq!(f.registry.snap_to_nearest_clip(1040, 100), 1000);
    assert_eq!(f.registry.snap_to_nearest_clip(2960, 100), 3000);
    assert_eq!(f.registry.snap_to_nearest_clip(2000, 100), 2000);
    assert_eq!(f.registry.snap_to_nearest_clip(1100, 100), 1100);
    // Ignoring the dragged element's own edges.
    assert_eq!(f.registry.snap_excluding(2990, 100, f.body), 3000);
    assert_eq!(f.registry.snap_excluding(1010, 100, f.body), 1000);
}

// ── Serialization roundtrip ────────────────────────────────────

fn build_project() -> Project {
    let f = build_registry();
    let mut project = Project::new("Integration Test Project");
    project.registry = f.registry;
    project
        .animations
        .push(Animation::new(f.intro, 400, AnimationKind::FadeIn));
    project
}

#[test]
fn project_survives_serialization_roundtrip() {
    let project = build_project();
    let file = ProjectFile::new(project);

    let json = file.to_json().unwrap();
    let loaded = ProjectFile::from_json(&json).unwrap();

    assert_eq!(loaded.project.name, "Integration Test Project");
    assert_eq!(loaded.project.registry.max_time(), 4500);
    assert_eq!(names(&loaded.project.registry), ["Intro", "Body", "Outro", "Music"]);
    assert_eq!(loaded.project.animations.len(), 1);
    assert_eq!(loaded.project.animations[0].kind, AnimationKind::FadeIn);

    let types: Vec<ElementType> = loaded
        .project
        .registry
        .elements()
        .iter()
        .map(|e| e.element_type())
        .collect();
    assert_eq!(
        types,
        [ElementType::Video, ElementType::Video, ElementType::Video, ElementType::Audio]
    );
}

#[test]
fn project_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    ProjectFile::new(build_project()).save_to_file(&path).unwrap();

    let loaded = ProjectFile::load_from_file(&path).unwrap();
    assert_eq!(loaded.project.registry.elements().len(), 4);
    assert!(ProjectFile::load_from_file(&dir.path().join("missing.json")).is_err());
}

// ── Loading hand-edited project files ──────────────────────────

/// Round-trip a two-timeline project through JSON, editing the serialized
/// registry on the way.
fn reload_with(edit: impl FnOnce(&mut serde_json::Value)) -> Project {
    let mut project = build_project();
    project.registry.create_timeline("B-roll");
    let json = ProjectFile::new(project).to_json().unwrap();
    let mut raw: serde_json::Value = serde_json::from_slice(&json).unwrap();
    edit(&mut raw["project"]["registry"]);
    let json = serde_json::to_vec(&raw).unwrap();
    ProjectFile::from_json(&json).unwrap().project
}

#[test]
fn normalize_keeps_the_first_copy_of_a_repeated_id() {
    let mut project = reload_with(|registry| {
        let elements = registry["timelines"][0]["elements"].clone();
        registry["timelines"][1]["elements"] = elements;
    });
    let first = project.registry.timelines()[0].id;
    assert_eq!(project.registry.timelines()[1].elements.len(), 4);

    assert_eq!(project.registry.normalize(), 4);
    let registry = &project.registry;
    assert_eq!(registry.timelines()[0].elements.len(), 4);
    assert!(registry.timelines()[1].elements.is_empty());
    assert_eq!(registry.active_id(), Some(first));
    assert_eq!(registry.max_time(), 4500);
}

#[test]
fn unknown_active_timeline_falls_back_to_the_first() {
    let mut project = reload_with(|registry| {
        registry["active"] = serde_json::json!(Uuid::new_v4());
    });
    // An unresolvable active timeline accepts no inserts.
    assert!(project.registry.add_element(video("Orphan", 0, 100)).is_none());
    assert!(project.registry.elements().is_empty());
    assert_eq!(project.registry.selected(), None);

    assert_eq!(project.registry.normalize(), 0);
    let first = project.registry.timelines()[0].id;
    assert_eq!(project.registry.active_id(), Some(first));
    assert_eq!(names(&project.registry), ["Intro", "Body", "Outro", "Music"]);
    let late = video("Late", 4500, 5000);
    let late_id = late.id;
    assert!(project.registry.add_element(late).is_some());
    assert_eq!(project.registry.selected(), Some(late_id));
}

// ── Export pipeline integration ────────────────────────────────

#[test]
fn export_job_covers_the_time_bound() {
    let f = build_registry();
    let job = ExportJob::new(
        "/tmp/out.mp4",
        Container::Mp4,
        CanvasBounds::default(),
        f.registry.max_time(),
    );
    assert_eq!(job.frame_rate, FrameRate::FPS_30);
    assert_eq!(job.total_frames(), 135); // 4.5s × 30fps
    assert_eq!(job.frame_size(), (800, 500));
}

#[test]
fn export_args_mix_audio_at_element_offsets() {
    let f = build_registry();
    let music = f.registry.element(f.music).unwrap();
    let job = ExportJob::new(
        "/tmp/out.webm",
        Container::Webm,
        CanvasBounds::new(1280.0, 720.0),
        f.registry.max_time(),
    )
    .with_audio("media/music.mp3", music.time_frame.start);

    let args = job.ffmpeg_args();
    assert!(args.contains(&"1280x720".to_string()));
    assert!(args.contains(&"-filter_complex".to_string()));
    assert!(args.contains(&"media/music.mp3".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("/tmp/out.webm"));
}
