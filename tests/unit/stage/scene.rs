use super::*;
use crate::trigger::scheduler::TriggerKind;

const SCENE: &str = r#"{
    "page": {
        "elements": {
            "hero": { "left": 0, "top": 1000, "width": 1280, "height": 600 },
            "title": { "left": 0, "top": 1100, "width": 600, "height": 60, "text": "Grown slowly" }
        }
    },
    "viewport": { "scroll_y": 0, "width": 1280, "height": 800 },
    "effects": [
        { "name": "parallax", "config": { "section": "hero", "target": "hero" } },
        { "name": "stagger", "config": { "section": "hero", "target": "title" } },
        { "name": "burst", "config": { "section": "footer", "target": "footer" } }
    ],
    "steps": [
        { "at": 0.5, "scroll": 900 },
        { "at": 1.0, "scroll": 1400 }
    ]
}"#;

fn scene() -> Scene {
    Scene::from_reader(SCENE.as_bytes()).unwrap()
}

#[test]
fn run_reports_effects_events_and_styles() {
    let run = scene().run(30.0, None).unwrap();
    let trace = &run.trace;
    assert_eq!(trace.end_time, 3.0);
    assert_eq!(trace.frames, 91);

    let enabled: Vec<bool> = trace.effects.iter().map(|e| e.enabled).collect();
    assert_eq!(enabled, vec![true, true, false]);

    let first = &trace.events[0];
    assert_eq!(first.time, 0.5);
    assert_eq!(first.event.kind, TriggerKind::Enter);
    assert!(trace.events.iter().all(|e| e.time >= 0.5));

    // Parallax zone spans 200..1600; 1400 is 6/7 of the way.
    let y = trace.styles["hero"]["translateY"];
    assert!((y + 100.0 * 6.0 / 7.0).abs() < 1e-9);
    assert_eq!(trace.styles["title/word-0"]["opacity"], 1.0);
    assert_eq!(trace.failures, 0);
}

#[test]
fn teardown_steps_release_sections() {
    let mut def = scene().def().clone();
    def.steps.push(SceneStep {
        at: 1.5,
        teardown: Some("hero".into()),
        ..SceneStep::default()
    });
    let run = Scene::from_def(def).run(30.0, None).unwrap();
    assert!(run.stage.registry().is_empty());
    assert_eq!(run.stage.host().injected_count(), 0);
}

#[test]
fn pointer_steps_reach_followers() {
    let json = r#"{
        "page": { "elements": { "ring": { "left": 0, "top": 0, "width": 40, "height": 40 } } },
        "viewport": { "scroll_y": 0, "width": 1280, "height": 800 },
        "effects": [{ "name": "cursor-ring", "config": { "section": "ui", "target": "ring" } }],
        "steps": [
            { "at": 0.5, "pointer": [640, 400] },
            { "at": 2.0, "pointer_leave": true }
        ]
    }"#;
    let run = Scene::from_reader(json.as_bytes()).unwrap().run(60.0, None).unwrap();
    assert_eq!(run.stage.pointer(), None);
    assert_eq!(run.trace.styles["ring"]["translateX"], 640.0);
    assert_eq!(run.trace.styles["ring"]["translateY"], 400.0);
}

#[test]
fn run_can_stop_early() {
    let run = scene().run(10.0, Some(0.4)).unwrap();
    assert_eq!(run.trace.frames, 5);
    assert!(run.trace.events.is_empty());
}

#[test]
fn steps_must_be_ordered() {
    let mut def = scene().def().clone();
    def.steps.reverse();
    let err = Scene::from_def(def).validate().unwrap_err();
    assert!(err.to_string().contains("steps[1].at"));
}

#[test]
fn effect_configuration_errors_name_the_effect() {
    let mut def = scene().def().clone();
    def.effects[0].config.duration_multiplier = 50.0;
    let err = Scene::from_def(def).build().unwrap_err();
    assert!(err.to_string().contains("effects[0] (parallax)"));
}

#[test]
fn bad_fps_and_unknown_fields_are_rejected() {
    assert!(scene().run(0.0, None).is_err());
    let json = r#"{"page": {}, "viewport": {"scroll_y": 0, "width": 1, "height": 1}, "extra": 1}"#;
    let err = Scene::from_reader(json.as_bytes()).unwrap_err();
    assert!(matches!(err, RidgelineError::Serde(_)));
}
