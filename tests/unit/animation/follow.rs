use std::collections::HashMap;

use super::*;
use crate::foundation::core::ElementRect;

const FRAME: f64 = 1.0 / 60.0;

fn ring() -> Follower {
    Follower::new(FollowerId(1), "ring", Response::Track, Chase::Lerp { factor: 0.15 })
}

fn fog(intensity: f64) -> Follower {
    Follower::new(
        FollowerId(2),
        "fog-1",
        Response::Drift {
            region: "mountain".into(),
            intensity,
        },
        Chase::Tween {
            duration: 3.0,
            ease: Ease::OutCubic,
        },
    )
}

fn layout() -> HashMap<String, ElementRect> {
    HashMap::from([(
        "mountain".to_string(),
        ElementRect::new(0.0, 1000.0, 1000.0, 500.0),
    )])
}

fn vp(scroll_y: f64) -> Viewport {
    Viewport::new(scroll_y, 1000.0, 800.0).unwrap()
}

#[test]
fn lerp_closes_fifteen_percent_per_frame() {
    let mut f = ring();
    f.retarget(Vec2::new(100.0, 200.0));
    assert!(f.advance(FRAME));
    assert!((f.current().x - 15.0).abs() < 1e-9);
    assert!((f.current().y - 30.0).abs() < 1e-9);
    f.advance(FRAME);
    assert!((f.current().x - 27.75).abs() < 1e-9);
}

#[test]
fn lerp_is_frame_rate_independent_and_settles() {
    let mut fast = ring();
    let mut slow = ring();
    fast.retarget(Vec2::new(300.0, 0.0));
    slow.retarget(Vec2::new(300.0, 0.0));
    fast.advance(FRAME);
    fast.advance(FRAME);
    slow.advance(2.0 * FRAME);
    assert!((fast.current().x - slow.current().x).abs() < 1e-9);

    for _ in 0..400 {
        fast.advance(FRAME);
    }
    assert!(fast.is_settled());
    assert_eq!(fast.current(), Vec2::new(300.0, 0.0));
    assert!(!fast.advance(FRAME));
}

#[test]
fn track_keeps_the_last_goal_after_leave() {
    let f = ring();
    let l = layout();
    let goal = f.goal_for(Some(Point::new(40.0, 50.0)), &vp(0.0), &l);
    assert_eq!(goal, Vec2::new(40.0, 50.0));
    assert_eq!(f.goal_for(None, &vp(0.0), &l), f.goal());
}

#[test]
fn drift_goal_is_normalized_to_the_visible_region() {
    let f = fog(20.0);
    let l = layout();
    // Region spans viewport y 200..700 once scrolled by 800.
    let center = f.goal_for(Some(Point::new(500.0, 450.0)), &vp(800.0), &l);
    assert_eq!(center, Vec2::ZERO);
    let corner = f.goal_for(Some(Point::new(1000.0, 200.0)), &vp(800.0), &l);
    assert_eq!(corner, Vec2::new(20.0, -20.0));
    let quarter = f.goal_for(Some(Point::new(250.0, 575.0)), &vp(800.0), &l);
    assert_eq!(quarter, Vec2::new(-10.0, 10.0));
    assert_eq!(f.goal_for(Some(Point::new(500.0, 100.0)), &vp(800.0), &l), Vec2::ZERO);
    assert_eq!(f.goal_for(None, &vp(800.0), &l), Vec2::ZERO);
}

#[test]
fn tween_restarts_from_the_current_value() {
    let mut f = fog(10.0);
    f.retarget(Vec2::new(10.0, 0.0));
    f.advance(1.5);
    let midway = f.current();
    assert!((midway.x - 10.0 * Ease::OutCubic.apply(0.5)).abs() < 1e-9);

    f.retarget(Vec2::ZERO);
    f.advance(1.5);
    let expected = midway.x * (1.0 - Ease::OutCubic.apply(0.5));
    assert!((f.current().x - expected).abs() < 1e-9);
    f.advance(1.5);
    assert_eq!(f.current(), Vec2::ZERO);
    assert!(f.is_settled());
}

#[test]
fn writes_and_frames_follow_motion() {
    let mut frames = FrameScheduler::new();
    let mut f = ring();
    f.ensure_scheduled(&mut frames);
    assert_eq!(frames.pending_len(), 0);
    assert_eq!(f.take_write(), None);

    f.retarget(Vec2::new(10.0, 0.0));
    f.ensure_scheduled(&mut frames);
    assert!(frames.is_pending(FrameOwner::Follower(FollowerId(1))));
    f.advance(FRAME);
    assert_eq!(f.take_write(), Some(f.current()));
    assert_eq!(f.take_write(), None);

    f.cancel(&mut frames);
    assert_eq!(frames.pending_len(), 0);
    assert_eq!(f.frame(), None);
}
