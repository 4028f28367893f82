use super::*;

#[test]
fn last_move_in_a_frame_wins() {
    let mut p = PointerTracker::new();
    p.push_move(10.0, 20.0);
    p.push_move(30.0, 40.0);
    assert_eq!(p.position(), None);
    assert_eq!(p.flush(), Some(PointerChange::Moved(Point::new(30.0, 40.0))));
    assert_eq!(p.position(), Some(Point::new(30.0, 40.0)));
    assert_eq!(p.flush(), None);
}

#[test]
fn leave_clears_the_position_once() {
    let mut p = PointerTracker::new();
    p.push_leave();
    assert_eq!(p.flush(), None);

    p.push_move(5.0, 5.0);
    p.flush();
    p.push_move(6.0, 6.0);
    p.push_leave();
    assert_eq!(p.flush(), Some(PointerChange::Left));
    assert_eq!(p.position(), None);
    p.push_leave();
    assert_eq!(p.flush(), None);
}

#[test]
fn unchanged_and_non_finite_moves_are_silent() {
    let mut p = PointerTracker::new();
    p.push_move(1.0, 2.0);
    p.flush();
    p.push_move(1.0, 2.0);
    assert_eq!(p.flush(), None);
    p.push_move(f64::NAN, 2.0);
    assert_eq!(p.flush(), None);
    assert_eq!(p.position(), Some(Point::new(1.0, 2.0)));
}
