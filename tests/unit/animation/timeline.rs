use super::*;

fn fade(target: &str, start: f64, duration: f64) -> Segment {
    Segment::new(format!("fade-{target}"), start, duration, Ease::Linear).with(Mutation::new(
        Target::element(target),
        "opacity",
        0.0,
        1.0,
    ))
}

fn value_of(writes: &[PropertyWrite], target: &str, property: &str) -> Option<f64> {
    writes
        .iter()
        .rev()
        .find(|w| w.target == Target::element(target) && w.property == property)
        .map(|w| w.value)
}

fn composer_with(repeat: RepeatMode, segments: Vec<Segment>) -> (Composer, TimelineId) {
    let mut c = Composer::default();
    let id = c.create_timeline(TimelineConfig::new(repeat)).unwrap();
    for s in segments {
        c.add_segment(id, s).unwrap();
    }
    (c, id)
}

#[test]
fn interpolates_with_local_progress() {
    let (mut c, id) = composer_with(RepeatMode::None, vec![fade("a", 1.0, 2.0)]);
    c.seek(id, 2.0);
    let t = c.get_mut(id).unwrap();
    assert_eq!(value_of(&t.sample(), "a", "opacity"), Some(0.5));
}

#[test]
fn duration_is_max_segment_end() {
    let (c, id) = composer_with(
        RepeatMode::None,
        vec![fade("a", 0.0, 1.0), fade("b", 2.5, 0.5), fade("c", 0.5, 1.0)],
    );
    assert_eq!(c.get(id).unwrap().duration(), 3.0);
}

#[test]
fn segments_execute_by_start_offset_not_insertion() {
    // Inserted late-first; the earlier-starting segment must not override the later one.
    let late = Segment::new("late", 2.0, 1.0, Ease::Linear).with(Mutation::new(
        Target::element("x"),
        "opacity",
        1.0,
        0.0,
    ));
    let early = fade("x", 0.0, 1.0);
    let (mut c, id) = composer_with(RepeatMode::None, vec![late, early]);

    c.seek(id, 0.5);
    assert_eq!(value_of(&c.get_mut(id).unwrap().sample(), "x", "opacity"), Some(0.5));

    c.seek(id, 2.5);
    assert_eq!(value_of(&c.get_mut(id).unwrap().sample(), "x", "opacity"), Some(0.5));

    c.seek(id, 1.5);
    assert_eq!(value_of(&c.get_mut(id).unwrap().sample(), "x", "opacity"), Some(1.0));
}

#[test]
fn equal_offsets_layer_by_insertion_order() {
    let a = Segment::new("a", 0.0, 1.0, Ease::Linear).with(Mutation::new(
        Target::element("x"),
        "y",
        0.0,
        10.0,
    ));
    let b = Segment::new("b", 0.0, 1.0, Ease::Linear).with(Mutation::new(
        Target::element("x"),
        "y",
        0.0,
        20.0,
    ));
    let (mut c, id) = composer_with(RepeatMode::None, vec![a, b]);
    c.seek(id, 1.0);
    assert_eq!(value_of(&c.get_mut(id).unwrap().sample(), "x", "y"), Some(20.0));
}

#[test]
fn unstarted_segments_hold_their_from_value() {
    let (mut c, id) = composer_with(
        RepeatMode::None,
        vec![fade("a", 0.0, 1.0), fade("b", 0.5, 1.0)],
    );
    c.seek(id, 0.0);
    let writes = c.get_mut(id).unwrap().sample();
    assert_eq!(value_of(&writes, "a", "opacity"), Some(0.0));
    assert_eq!(value_of(&writes, "b", "opacity"), Some(0.0));
}

#[test]
fn play_completes_once_without_repeat() {
    let (mut c, id) = composer_with(RepeatMode::None, vec![fade("a", 0.0, 1.0)]);
    c.play(id);
    assert!(c.advance(id, 0.4));
    assert!(!c.advance(id, 0.7));
    let t = c.get(id).unwrap();
    assert_eq!(t.state(), PlayState::Complete);
    assert_eq!(t.cursor(), 1.0);
}

#[test]
fn initial_delay_holds_the_cursor() {
    let mut c = Composer::default();
    let id = c
        .create_timeline(TimelineConfig::new(RepeatMode::None).delayed(0.5))
        .unwrap();
    c.add_segment(id, fade("a", 0.0, 1.0)).unwrap();
    c.play(id);
    assert!(c.advance(id, 0.3));
    assert_eq!(c.get(id).unwrap().cursor(), 0.0);
    assert!(c.advance(id, 0.4));
    assert!((c.get(id).unwrap().cursor() - 0.2).abs() < 1e-9);
}

#[test]
fn loop_wraps_to_start() {
    let (mut c, id) = composer_with(RepeatMode::Loop, vec![fade("a", 0.0, 2.0)]);
    c.play(id);
    assert!(c.advance(id, 2.5));
    let t = c.get(id).unwrap();
    assert!((t.cursor() - 0.5).abs() < 1e-9);
    assert_eq!(t.direction(), Direction::Forward);
}

#[test]
fn yoyo_flips_direction_each_pass() {
    let (mut c, id) = composer_with(RepeatMode::Yoyo, vec![fade("a", 0.0, 2.0)]);
    c.play(id);
    assert!(c.advance(id, 2.5));
    let t = c.get(id).unwrap();
    assert!((t.cursor() - 1.5).abs() < 1e-9);
    assert_eq!(t.direction(), Direction::Backward);
    assert_eq!(t.state(), PlayState::Reversed);

    assert!(c.advance(id, 2.0));
    let t = c.get(id).unwrap();
    assert!((t.cursor() - 0.5).abs() < 1e-9);
    assert_eq!(t.direction(), Direction::Forward);
}

#[test]
fn reverse_continues_from_current_value() {
    let (mut c, id) = composer_with(RepeatMode::None, vec![fade("a", 0.0, 2.0)]);
    c.play(id);
    c.advance(id, 1.5);
    let before = value_of(&c.get_mut(id).unwrap().sample(), "a", "opacity").unwrap();

    c.reverse(id);
    c.advance(id, 0.0);
    let at_flip = value_of(&c.get_mut(id).unwrap().sample(), "a", "opacity").unwrap();
    assert_eq!(before, at_flip);

    c.advance(id, 0.5);
    let after = value_of(&c.get_mut(id).unwrap().sample(), "a", "opacity").unwrap();
    assert!((after - 0.5).abs() < 1e-9);

    assert!(!c.advance(id, 5.0));
    assert_eq!(c.get(id).unwrap().state(), PlayState::Complete);
    assert_eq!(c.get(id).unwrap().cursor(), 0.0);
}

#[test]
fn replay_after_reverse_matches_fresh_play() {
    let segs = || {
        vec![
            Segment::new("rise", 0.0, 1.0, Ease::OutBack).with(Mutation::new(
                Target::element("a"),
                "y",
                40.0,
                0.0,
            )),
            Segment::new("fade", 0.3, 0.9, Ease::InOutSine).with(Mutation::new(
                Target::element("a"),
                "opacity",
                0.0,
                1.0,
            )),
        ]
    };

    let (mut fresh, f_id) = composer_with(RepeatMode::None, segs());
    fresh.play(f_id);
    fresh.advance(f_id, 0.7);
    let expected = fresh.get_mut(f_id).unwrap().sample();

    let (mut used, u_id) = composer_with(RepeatMode::None, segs());
    used.play(u_id);
    used.advance(u_id, 0.7);
    used.reverse(u_id);
    used.advance(u_id, 0.2);
    used.seek(u_id, 0.0);
    used.play(u_id);
    used.advance(u_id, 0.7);
    let replayed = used.get_mut(u_id).unwrap().sample();

    assert_eq!(expected.len(), replayed.len());
    for (a, b) in expected.iter().zip(&replayed) {
        assert_eq!(a.target, b.target);
        assert_eq!(a.property, b.property);
        assert!((a.value - b.value).abs() < 1e-9);
    }
}

#[test]
fn play_from_complete_restarts() {
    let (mut c, id) = composer_with(RepeatMode::None, vec![fade("a", 0.0, 1.0)]);
    c.play(id);
    c.advance(id, 2.0);
    c.play(id);
    assert_eq!(c.get(id).unwrap().cursor(), 0.0);
    assert!(c.is_running(id));
}

#[test]
fn pause_holds_and_seek_marks_dirty() {
    let (mut c, id) = composer_with(RepeatMode::None, vec![fade("a", 0.0, 1.0)]);
    c.get_mut(id).unwrap().sample();
    assert!(!c.get(id).unwrap().needs_apply());
    c.play(id);
    c.advance(id, 0.25);
    c.pause(id);
    assert!(!c.advance(id, 0.5));
    assert_eq!(c.get(id).unwrap().cursor(), 0.25);
    c.get_mut(id).unwrap().sample();
    c.seek(id, 0.75);
    assert!(c.get(id).unwrap().needs_apply());
}

#[test]
fn seek_clamps_to_duration() {
    let (mut c, id) = composer_with(RepeatMode::None, vec![fade("a", 0.0, 1.0)]);
    c.seek(id, 9.0);
    assert_eq!(c.get(id).unwrap().cursor(), 1.0);
    c.seek(id, -1.0);
    assert_eq!(c.get(id).unwrap().cursor(), 0.0);
    c.seek_progress(id, 0.5);
    assert_eq!(c.get(id).unwrap().cursor(), 0.5);
}

#[test]
fn overshoot_easing_is_not_clamped_in_output() {
    let seg = Segment::new("pop", 0.0, 1.0, Ease::OutBack).with(Mutation::new(
        Target::element("a"),
        "scale",
        0.0,
        1.0,
    ));
    let (mut c, id) = composer_with(RepeatMode::None, vec![seg]);
    c.seek(id, 0.7);
    let v = value_of(&c.get_mut(id).unwrap().sample(), "a", "scale").unwrap();
    assert!(v > 1.0);
}

#[test]
fn motion_scale_stretches_durations() {
    let mut c = Composer::new(MotionScale {
        duration_scale: 0.6,
        loops_allowed: true,
    });
    let id = c
        .create_timeline(TimelineConfig::new(RepeatMode::Yoyo))
        .unwrap();
    c.add_segment(id, fade("a", 0.0, 10.0)).unwrap();
    assert!((c.get(id).unwrap().duration() - 6.0).abs() < 1e-9);
}

#[test]
fn frozen_loops_ignore_transport() {
    let mut c = Composer::new(MotionScale {
        duration_scale: 1.0,
        loops_allowed: false,
    });
    let id = c
        .create_timeline(TimelineConfig::new(RepeatMode::Loop))
        .unwrap();
    c.add_segment(id, fade("a", 0.0, 1.0)).unwrap();
    assert!(c.get(id).unwrap().is_frozen());
    c.play(id);
    assert!(!c.is_running(id));
}

#[test]
fn invalid_segments_are_rejected() {
    let (mut c, id) = composer_with(RepeatMode::None, vec![]);
    assert!(c.add_segment(id, fade("a", -1.0, 1.0)).is_err());
    assert!(c.add_segment(id, fade("a", 0.0, f64::NAN)).is_err());
    assert!(c.add_segment(TimelineId(999), fade("a", 0.0, 1.0)).is_err());
}

#[test]
fn empty_timeline_completes_immediately() {
    let (mut c, id) = composer_with(RepeatMode::Loop, vec![]);
    c.play(id);
    assert!(!c.advance(id, 0.016));
    assert_eq!(c.get(id).unwrap().state(), PlayState::Complete);
}

#[test]
fn kill_is_idempotent() {
    let (mut c, id) = composer_with(RepeatMode::None, vec![fade("a", 0.0, 1.0)]);
    assert!(c.kill(id));
    assert!(!c.kill(id));
    assert!(!c.play(id));
    assert!(c.is_empty());
}

#[test]
fn repeat_mode_names() {
    assert_eq!(RepeatMode::from_name("YOYO").unwrap(), RepeatMode::Yoyo);
    assert_eq!(RepeatMode::from_name("loop").unwrap(), RepeatMode::Loop);
    assert!(RepeatMode::from_name("bounce").is_err());
    for m in [RepeatMode::None, RepeatMode::Loop, RepeatMode::Yoyo] {
        assert_eq!(RepeatMode::from_name(m.name()).unwrap(), m);
    }
}
