use super::*;
use std::cell::RefCell;
use std::rc::Rc;

fn tracker() -> ViewportTracker {
    ViewportTracker::new(Viewport::new(0.0, 1280.0, 800.0).unwrap())
}

#[test]
fn latest_scroll_in_a_frame_wins() {
    let mut t = tracker();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    t.on_scroll_or_resize(move |v, _| sink.borrow_mut().push(v.scroll_y));

    t.push_scroll(100.0);
    t.push_scroll(250.0);
    t.push_scroll(180.0);
    assert_eq!(t.current_scroll_y(), 0.0);

    let change = t.flush().unwrap();
    assert!(change.scrolled);
    assert!(!change.resized);
    assert_eq!(*seen.borrow(), vec![180.0]);
    assert_eq!(t.current_scroll_y(), 180.0);
}

#[test]
fn flush_without_input_is_silent() {
    let mut t = tracker();
    let calls = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&calls);
    t.on_scroll_or_resize(move |_, _| *sink.borrow_mut() += 1);
    assert!(t.flush().is_none());
    t.push_scroll(0.0);
    assert!(t.flush().is_none());
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn resize_updates_height() {
    let mut t = tracker();
    t.push_resize(640.0, 900.0);
    let change = t.flush().unwrap();
    assert!(change.resized);
    assert_eq!(t.viewport_height(), 900.0);
}

#[test]
fn unsubscribe_is_idempotent() {
    let mut t = tracker();
    let sub = t.on_scroll_or_resize(|_, _| {});
    assert_eq!(t.listener_count(), 1);
    assert!(t.unsubscribe(sub));
    assert!(!t.unsubscribe(sub));
    assert_eq!(t.listener_count(), 0);
}

#[test]
fn garbage_input_is_dropped() {
    let mut t = tracker();
    t.push_scroll(f64::NAN);
    t.push_resize(0.0, 100.0);
    assert!(t.flush().is_none());
}

#[test]
fn viewport_validation() {
    assert!(Viewport::new(0.0, 0.0, 100.0).is_err());
    assert!(Viewport::new(f64::INFINITY, 10.0, 100.0).is_err());
}
