//! Integration tests for the editor session.
//!
//! Drives an `EditorSession` over the headless surface the way a front end
//! would: import, place, animate, play, persist and reload.

use std::path::Path;

use reel_ai::KeywordNamingService;
use reel_core::{CanvasBounds, Result, TimeFrame};
use reel_engine::{
    sort_clips_by_topic, EditorSession, EngineConfig, HeadlessSurface, ManualClock, Property,
    ResourceKind, Target,
};
use reel_media::{MediaInfo, Prober};
use reel_timeline::{
    Animation, AnimationKind, Direction, EditorElement, MediaSource, ProjectFile, SlideProps,
    TextReveal,
};
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

struct FixedProber(MediaInfo);

impl Prober for FixedProber {
    fn probe(&self, _path: &Path) -> Result<MediaInfo> {
        Ok(self.0.clone())
    }
}

fn hd_video(duration: i64) -> MediaInfo {
    let mut info = MediaInfo::fallback(4096);
    info.duration_ms = Some(duration);
    info.intrinsic_width = Some(1280);
    info.intrinsic_height = Some(720);
    info
}

fn session_with(config: EngineConfig) -> (EditorSession<HeadlessSurface>, ManualClock) {
    let wall = ManualClock::new();
    let surface = HeadlessSurface::new(config.canvas);
    let session = EditorSession::with_clock(config, surface, Box::new(wall.clone()));
    (session, wall)
}

fn session() -> (EditorSession<HeadlessSurface>, ManualClock) {
    session_with(EngineConfig::default())
}

fn clip(session: &mut EditorSession<HeadlessSurface>, url: &str, start: i64, end: i64) -> Uuid {
    let element = EditorElement::video(url, MediaSource::new(url), TimeFrame::new(start, end));
    session.add_element(element).unwrap().unwrap()
}

// ── Import and placement ───────────────────────────────────────

#[test]
fn imported_file_is_placed_with_probed_metadata() {
    let (mut s, _) = session();
    let prober = FixedProber(hd_video(6000));
    let resource = s.import_file(ResourceKind::Video, Path::new("/media/harbor.mp4"), &prober);

    assert_eq!(s.library().get(resource).unwrap().file_name, "harbor.mp4");
    let id = s.add_video_from_resource(resource).unwrap().unwrap();
    let element = s.element(id).unwrap();
    assert_eq!(element.time_frame, TimeFrame::new(0, 6000));
    assert_eq!(element.kind.source().unwrap().resource_id, Some(resource));
    assert_eq!(s.max_time(), 6000);

    let object = s.surface().object_for(id).unwrap();
    assert_eq!(object.spec.source_url.as_deref(), Some("/media/harbor.mp4"));
    assert_eq!(s.surface().active(), element.visual);
}

#[test]
fn text_spans_the_timeline_and_audio_has_no_visual() {
    let (mut s, _) = session();
    let audio = s.import_resource(ResourceKind::Audio, "/media/song.mp3", "song.mp3", hd_video(3000));
    clip(&mut s, "a.mp4", 0, 5000);
    let song = s.add_audio_from_resource(audio).unwrap().unwrap();
    let title = s.add_text("Welcome", 48.0, 700).unwrap().unwrap();

    assert_eq!(s.element(title).unwrap().time_frame, TimeFrame::new(0, 5000));
    assert_eq!(s.element(title).unwrap().name, "Text 3");
    assert!(s.surface().object_for(song).is_none());
    assert_eq!(s.surface().len(), 2);
}

// ── Editing through the session ────────────────────────────────

#[test]
fn split_halves_follow_the_playhead() {
    let (mut s, _) = session();
    let a = clip(&mut s, "a.mp4", 0, 4000);
    assert!(s.split_element_at_time(a, 1000).unwrap());
    let right = s.elements()[1].id;

    assert!(s.seek(1500));
    assert_eq!(s.surface().media(a), Some((1500.0, false)));
    assert_eq!(s.surface().media(right), Some((500.0, false)));
    assert!(!s.surface().object_for(a).unwrap().state.unwrap().visible);
    assert!(s.surface().object_for(right).unwrap().state.unwrap().visible);

    // Merging the halves back gives one element with the original extent.
    let merged = s.merge_elements(&[a, right]).unwrap().unwrap();
    assert_eq!(s.elements().len(), 1);
    assert_eq!(s.element(merged).unwrap().time_frame, TimeFrame::new(0, 4000));
    assert_eq!(s.element(merged).unwrap().origin_id, a);
    assert_eq!(s.surface().len(), 1);
}

#[test]
fn undo_history_spans_mixed_edits() {
    let (mut s, _) = session();
    let a = clip(&mut s, "a.mp4", 0, 1000);
    let b = clip(&mut s, "b.mp4", 1000, 2000);
    s.ripple_timeline_changes(a, 250).unwrap();
    s.remove_element(a).unwrap();
    assert_eq!(s.element(b).unwrap().time_frame, TimeFrame::new(1250, 2000));

    assert!(s.undo().unwrap());
    assert!(s.element(a).is_some());
    assert!(s.surface().object_for(a).is_some());
    assert!(s.undo().unwrap());
    assert_eq!(s.element(b).unwrap().time_frame, TimeFrame::new(1000, 2000));

    assert!(s.redo().unwrap());
    assert_eq!(s.element(b).unwrap().time_frame.start, 1250);
    assert!(s.can_redo());
}

#[test]
fn config_file_drives_snapping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let config = EngineConfig {
        snap_threshold_ms: 300,
        ..EngineConfig::default()
    };
    config.save(&path).unwrap();

    let (mut s, _) = session_with(EngineConfig::load(&path).unwrap());
    let a = clip(&mut s, "a.mp4", 0, 1000);
    clip(&mut s, "b.mp4", 2000, 3000);
    assert_eq!(s.snap_to_nearest_clip(1250), 1000);
    assert_eq!(s.snap_to_nearest_clip(1500), 1500);
    assert_eq!(s.snap_dragged(a, 1250), 1250);
}

// ── Animation and playback ─────────────────────────────────────

#[test]
fn slide_in_by_character_creates_glyphs() {
    let (mut s, wall) = session();
    clip(&mut s, "bg.mp4", 0, 2000);
    let title = s.add_text("Hey", 40.0, 400).unwrap().unwrap();
    let slide = SlideProps {
        text_reveal: TextReveal::ByCharacter,
        use_clip_mask: true,
        ..SlideProps::new(Direction::Left)
    };
    s.add_animation(Animation::new(title, 1000, AnimationKind::SlideIn(slide)))
        .unwrap();

    let glyphs = s.surface().glyphs(title).unwrap();
    assert_eq!(glyphs.specs.len(), 3);
    assert!(s.surface().object_for(title).unwrap().clip_mask.is_some());

    // While the glyphs are revealed the text block itself is hidden.
    s.play();
    wall.advance_ms(500);
    assert!(s.tick());
    let block = s.surface().object_for(title).unwrap().state.unwrap();
    assert!(block.visible);
    assert_eq!(block.opacity, 0.0);
    let glyphs = s.surface().glyphs(title).unwrap();
    for index in 0..3usize {
        let state = glyphs.states[&index];
        assert!((state.opacity - 1.0).abs() < 1e-6);
    }
}

#[test]
fn fade_out_follows_time_frame_edits() {
    let (mut s, _) = session();
    let a = clip(&mut s, "a.mp4", 0, 3000);
    s.add_animation(Animation::new(a, 1000, AnimationKind::FadeOut))
        .unwrap();
    let sample = |s: &EditorSession<HeadlessSurface>, t| {
        s.schedule().sample(Target::Element(a), Property::Opacity, t)
    };
    assert_eq!(sample(&s, 2500.0), Some(0.5));

    s.update_time_frame(a, reel_core::TimeFramePatch::end(2000))
        .unwrap();
    assert_eq!(sample(&s, 1500.0), Some(0.5));
}

#[test]
fn playback_loops_at_the_time_bound() {
    let (mut s, wall) = session();
    let a = clip(&mut s, "a.mp4", 0, 1000);
    s.play();
    wall.advance_ms(600);
    s.tick();
    assert!(s.current_time_ms() >= 600.0 - 1e-9);

    wall.advance_ms(400);
    s.tick();
    assert_eq!(s.clock().frame_index(), 0);
    assert_eq!(s.surface().media(a), Some((0.0, true)));

    s.pause();
    assert_eq!(s.surface().media(a), Some((0.0, false)));
}

// ── Persistence ────────────────────────────────────────────────

#[test]
fn project_file_reloads_into_a_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");

    let (mut s, _) = session();
    s.set_name("Holiday");
    let a = clip(&mut s, "a.mp4", 0, 2000);
    let title = s.add_text("Day one", 32.0, 400).unwrap().unwrap();
    s.add_animation(Animation::new(a, 500, AnimationKind::FadeIn))
        .unwrap();
    s.set_background_color("#000000");
    ProjectFile::new(s.to_project()).save_to_file(&path).unwrap();

    let (mut other, _) = session();
    clip(&mut other, "stale.mp4", 0, 9000);
    let project = ProjectFile::load_from_file(&path).unwrap().project;
    other.load_project(project).unwrap();

    assert_eq!(other.name(), "Holiday");
    assert_eq!(other.max_time(), 2000);
    assert_eq!(other.elements().len(), 2);
    assert_eq!(other.surface().len(), 2);
    assert!(other.surface().object_for(title).is_some());
    assert!(other.schedule().animates(a));
    assert_eq!(other.surface().background(), "#000000");
    assert!(!other.can_undo());
}

#[test]
fn loading_repairs_repeated_ids_and_a_missing_active_timeline() {
    let (mut s, _) = session();
    let a = clip(&mut s, "a.mp4", 0, 1000);
    let json = ProjectFile::new(s.to_project()).to_json().unwrap();
    let mut raw: serde_json::Value = serde_json::from_slice(&json).unwrap();
    let registry = &mut raw["project"]["registry"];
    let mut copy = registry["timelines"][0].clone();
    copy["id"] = serde_json::json!(Uuid::new_v4());
    registry["timelines"].as_array_mut().unwrap().push(copy);
    registry["active"] = serde_json::json!(Uuid::new_v4());
    let project = ProjectFile::from_json(&serde_json::to_vec(&raw).unwrap())
        .unwrap()
        .project;

    let (mut other, _) = session();
    other.load_project(project).unwrap();
    let loaded = other.to_project().registry;
    assert_eq!(loaded.timelines().len(), 2);
    assert!(loaded.timelines()[1].elements.is_empty());
    assert_eq!(other.elements().len(), 1);
    assert_eq!(other.elements()[0].id, a);
    assert_eq!(other.surface().len(), 1);

    let b = clip(&mut other, "b.mp4", 1000, 2000);
    assert_eq!(other.selected(), Some(b));
    assert_eq!(other.elements().len(), 2);
    assert!(other.undo().unwrap());
    assert_eq!(other.elements().len(), 1);
    assert_eq!(other.selected(), None);
}

#[test]
fn export_job_reflects_session_state() {
    let config = EngineConfig {
        canvas: CanvasBounds::new(1280.0, 720.0),
        ..EngineConfig::default()
    };
    let (mut s, _) = session_with(config);
    clip(&mut s, "a.mp4", 0, 2000);
    let music = s.import_resource(ResourceKind::Audio, "/media/m.mp3", "m.mp3", hd_video(1500));
    let music = s.add_audio_from_resource(music).unwrap().unwrap();
    s.update_time_frame(music, reel_core::TimeFramePatch::both(500, 2000))
        .unwrap();

    let job = s.export_job("/tmp/out.mp4");
    assert_eq!(job.duration_ms, 2000);
    assert_eq!(job.frame_size(), (1280, 720));
    assert_eq!(job.audio_inputs.len(), 1);
    assert_eq!(job.audio_inputs[0].offset_ms, 500);
    assert_eq!(job.total_frames(), 60);
}

// ── Topic sorting ──────────────────────────────────────────────

#[tokio::test]
async fn clips_sharing_a_topic_become_adjacent() {
    let (mut s, _) = session();
    let beach_1 = clip(&mut s, "beach_1.mp4", 0, 1000);
    let city = clip(&mut s, "city.mp4", 1000, 2000);
    let title = s.add_text("Trip", 20.0, 400).unwrap().unwrap();
    let beach_2 = clip(&mut s, "beach_2.mp4", 2000, 3000);
    s.split_element_at_time(city, 1500).unwrap();
    assert!(s.can_undo());

    assert!(sort_clips_by_topic(&mut s, &KeywordNamingService::new())
        .await
        .unwrap());
    let order: Vec<Uuid> = s.elements().iter().map(|e| e.id).collect();
    assert_eq!(order[0], beach_1);
    assert_eq!(order[1], beach_2);
    assert_eq!(order[2], city);
    assert_eq!(order[4], title);
    assert!(!s.can_undo());
}
