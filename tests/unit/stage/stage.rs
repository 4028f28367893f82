use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::animation::timeline::PlayState;
use crate::foundation::core::ElementRect;
use crate::host::StaticPage;
use crate::stage::config::MotionPolicy;
use crate::trigger::anchor::Anchor;
use crate::trigger::scheduler::ZoneMode;

fn page() -> StaticPage {
    let mut page = StaticPage::new()
        .with_element("hero", ElementRect::new(0.0, 1000.0, 1280.0, 600.0))
        .with_element("logo", ElementRect::new(100.0, 1200.0, 200.0, 200.0))
        .with_element("title", ElementRect::new(0.0, 1100.0, 600.0, 60.0));
    page.set_text("title", "Rooted in living soil");
    page
}

fn stage_with(config: StageConfig) -> Stage<StaticPage> {
    Stage::new(page(), config, Viewport::new(0.0, 1280.0, 800.0).unwrap()).unwrap()
}

fn stage() -> Stage<StaticPage> {
    stage_with(StageConfig::default())
}

fn timeline_of(stage: &Stage<StaticPage>, handle: EffectHandle) -> TimelineId {
    stage.registry().get(handle.id()).unwrap().resources.timelines[0]
}

#[test]
fn invalid_stage_config_is_rejected() {
    let config = StageConfig {
        max_frame_dt: 0.0,
        ..StageConfig::default()
    };
    let err = Stage::new(page(), config, Viewport::new(0.0, 1280.0, 800.0).unwrap()).unwrap_err();
    assert!(matches!(err, RidgelineError::Configuration(_)));
}

#[test]
fn host_preference_enables_reduced_motion() {
    let mut page = page();
    page.set_reduced_motion(true);
    let reduced = Stage::new(
        page,
        StageConfig::default(),
        Viewport::new(0.0, 1280.0, 800.0).unwrap(),
    )
    .unwrap();
    assert!(reduced.is_reduced_motion());
    assert!(!stage().is_reduced_motion());
}

#[test]
fn frame_step_is_clamped() {
    let mut stage = stage();
    assert_eq!(stage.frame(0.0).dt, 0.0);
    assert_eq!(stage.frame(5.0).dt, 0.1);
    assert!((stage.frame(5.016).dt - 0.016).abs() < 1e-9);
    assert_eq!(stage.frame(4.0).dt, 0.0);
}

#[test]
fn triggered_timeline_is_sampled_in_the_entering_frame() {
    let mut stage = stage();
    stage
        .init_effect("stagger", EffectConfig::new("hero-section", "title"))
        .unwrap();
    stage.frame(0.0);
    assert_eq!(stage.host().style("title/word-0", "opacity"), Some(0.0));

    let seen: Rc<RefCell<Vec<&'static str>>> = Rc::default();
    let log = seen.clone();
    stage.on_scroll_or_resize("glue", move |_, _| log.borrow_mut().push("viewport"));
    let log = seen.clone();
    stage
        .register_zone(
            "glue",
            ZoneSpec::new(
                "title-in",
                "title",
                "top 80%".parse::<Anchor>().unwrap(),
                ZoneMode::OneShot,
            ),
            TriggerCallbacks::none().on_enter(move |_| log.borrow_mut().push("enter")),
        )
        .unwrap();

    // Zone starts at 1100 - 640 = 460; the stagger delay puts word 0 at t = 0.
    stage.push_scroll(500.0);
    stage.frame(0.016);
    stage.frame(0.116);
    assert_eq!(*seen.borrow(), vec!["viewport", "enter"]);
    let opacity = stage.host().style("title/word-0", "opacity").unwrap();
    assert!(opacity > 0.0);
}

#[test]
fn enter_frame_samples_before_time_advances() {
    let mut stage = stage();
    let handle = stage
        .init_effect("stagger", EffectConfig::new("hero-section", "title"))
        .unwrap();
    stage.frame(0.0);
    stage.push_scroll(500.0);
    let report = stage.frame(0.05);
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.timelines_sampled, 1);
    let tl = stage.composer().get(timeline_of(&stage, handle)).unwrap();
    assert_eq!(tl.cursor(), 0.0);
    assert_eq!(tl.state(), PlayState::Playing);
    assert!(stage.frames().is_pending(FrameOwner::Timeline(tl.id())));
}

#[test]
fn reduced_motion_scales_durations() {
    let mut stage = stage_with(StageConfig {
        reduced_motion: true,
        ..StageConfig::default()
    });
    let config = EffectConfig::new("strata", "logo")
        .with_params(serde_json::json!({ "duration": 10.0 }));
    let handle = stage.init_effect("parallax", config).unwrap();
    let tl = stage.composer().get(timeline_of(&stage, handle)).unwrap();
    assert!((tl.duration() - 6.0).abs() < 1e-9);
}

#[test]
fn reduced_motion_can_freeze_loops() {
    let mut stage = stage_with(StageConfig {
        reduced_motion: true,
        motion: MotionPolicy {
            duration_scale: 0.6,
            disable_infinite_loops: true,
        },
        ..StageConfig::default()
    });
    let handle = stage
        .init_effect("breathing", EffectConfig::new("about", "logo"))
        .unwrap();
    let id = timeline_of(&stage, handle);
    stage.frame(0.0);
    stage.frame(0.05);
    assert!(!stage.composer().is_running(id));
    assert!(!stage.frames().is_pending(FrameOwner::Timeline(id)));
    assert_eq!(stage.host().style("logo", "scale"), Some(1.0));
}

#[test]
fn write_failure_stops_only_the_failing_timeline() {
    let mut stage = stage();
    let logo = stage
        .init_effect("breathing", EffectConfig::new("about", "logo"))
        .unwrap();
    let hero = stage
        .init_effect("breathing", EffectConfig::new("hero-section", "hero"))
        .unwrap();
    let logo_tl = timeline_of(&stage, logo);
    let hero_tl = timeline_of(&stage, hero);

    stage.host_mut().remove_element("logo");
    let report = stage.frame(0.0);
    assert_eq!(report.failures, 1);
    assert!(stage.composer().get(logo_tl).is_none());
    assert!(stage.composer().is_running(hero_tl));
    assert_eq!(stage.host().style("hero", "scale"), Some(1.0));

    let report = stage.frame(1.0 / 60.0);
    assert_eq!(report.failures, 0);
    assert!(stage.host().style("hero", "scale").unwrap() > 1.0);

    // The record stays registered until its section is torn down.
    assert!(stage.teardown_effect(logo));
}

#[test]
fn resize_recomputes_zones_and_canvas_sizes() {
    let mut stage = stage();
    let handle = stage
        .init_effect("particle-burst", EffectConfig::new("hero-section", "hero"))
        .unwrap();
    let zone = stage.registry().get(handle.id()).unwrap().resources.zones[0];
    assert_eq!(stage.triggers().bounds(zone), Some((600.0, None)));

    stage
        .host_mut()
        .set_rect("hero", ElementRect::new(0.0, 1000.0, 1280.0, 900.0));
    stage.push_resize(1280.0, 1000.0);
    let report = stage.frame(0.0);
    assert!(report.viewport.is_some_and(|c| c.resized));
    assert_eq!(stage.triggers().bounds(zone), Some((500.0, None)));

    let canvases = stage.host().canvases();
    assert_eq!(canvases.len(), 1);
    let canvas = canvases[0].2.borrow();
    assert_eq!((canvas.width, canvas.height), (1280, 900));
}

#[test]
fn play_pause_reverse_keep_frames_in_sync() {
    let mut stage = stage();
    let handle = stage
        .init_effect("parallax", EffectConfig::new("strata", "logo"))
        .unwrap();
    let id = timeline_of(&stage, handle);
    assert!(!stage.frames().is_pending(FrameOwner::Timeline(id)));

    assert!(stage.play(id));
    assert!(stage.frames().is_pending(FrameOwner::Timeline(id)));
    assert!(stage.pause(id));
    assert!(!stage.frames().is_pending(FrameOwner::Timeline(id)));
    assert!(stage.seek(id, 0.5));
    assert!(stage.reverse(id));
    assert!(stage.frames().is_pending(FrameOwner::Timeline(id)));
    assert!(!stage.play(TimelineId(999)));
}

#[test]
fn teardown_section_releases_everything_once() {
    let mut stage = stage();
    stage
        .init_effect("particles", EffectConfig::new("hero-section", "hero"))
        .unwrap();
    stage
        .init_effect("stagger", EffectConfig::new("hero-section", "title"))
        .unwrap();
    stage
        .init_effect("reveal", EffectConfig::new("hero-section", "hero"))
        .unwrap();
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    stage.on_scroll_or_resize("hero-section", move |_, _| *counter.borrow_mut() += 1);
    stage
        .register_zone(
            "hero-section",
            ZoneSpec::new("raw", "hero", "top bottom".parse().unwrap(), ZoneMode::Toggle),
            TriggerCallbacks::none(),
        )
        .unwrap();

    stage.push_scroll(700.0);
    stage.frame(0.0);
    stage.frame(0.016);
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(stage.host().injected_count(), 6);
    assert!(stage.frames().pending_len() > 0);
    let canvases = stage.host().canvases();
    assert_eq!(canvases.len(), 2);

    assert!(stage.teardown_section("hero-section"));
    assert!(stage.registry().is_empty());
    assert!(stage.composer().is_empty());
    assert!(stage.triggers().is_empty());
    assert!(stage.particles().is_empty());
    assert_eq!(stage.frames().pending_len(), 0);
    assert_eq!(stage.host().injected_count(), 0);
    assert!(canvases.iter().all(|(_, _, c)| !c.borrow().attached));
    assert!(stage.host().canvases().is_empty());

    stage.push_scroll(900.0);
    let report = stage.frame(0.032);
    assert!(report.events.is_empty());
    assert_eq!(*calls.borrow(), 1);

    assert!(!stage.teardown_section("hero-section"));
    assert!(!stage.teardown_section("never-initialized"));
}

#[test]
fn disabled_handles_tear_down_as_no_ops() {
    let mut stage = stage();
    let handle = stage
        .init_effect("parallax", EffectConfig::new("ghost", "nowhere"))
        .unwrap();
    assert!(!handle.is_enabled());
    assert!(!handle.teardown(&mut stage));
    assert!(!stage.teardown_section("ghost"));
}

#[test]
fn pointer_input_is_coalesced_per_frame() {
    let mut stage = stage();
    stage.push_pointer(10.0, 10.0);
    stage.push_pointer(40.0, 30.0);
    let report = stage.frame(0.0);
    assert_eq!(report.pointer, Some(PointerChange::Moved(Point::new(40.0, 30.0))));
    assert_eq!(stage.pointer(), Some(Point::new(40.0, 30.0)));
    assert_eq!(stage.frame(0.016).pointer, None);

    stage.push_pointer_leave();
    assert_eq!(stage.frame(0.032).pointer, Some(PointerChange::Left));
    assert_eq!(stage.pointer(), None);
}

#[test]
fn follower_write_failure_drops_only_that_follower() {
    let mut stage = stage();
    let ring = stage
        .init_effect("cursor-ring", EffectConfig::new("cursor", "logo"))
        .unwrap();
    let follower = stage.registry().get(ring.id()).unwrap().resources.followers[0];
    stage.host_mut().remove_element("logo");
    stage.push_pointer(100.0, 100.0);
    assert_eq!(stage.frame(0.0).failures, 0);

    let report = stage.frame(1.0 / 60.0);
    assert_eq!(report.failures, 1);
    assert!(stage.follower(follower).is_none());
    assert_eq!(stage.frames().pending_len(), 0);
    assert!(stage.teardown_effect(ring));
}
