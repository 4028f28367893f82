use super::*;
use crate::render::surface::{RecordingSurface, SurfaceOp};
use kurbo::Shape;

#[test]
fn wipe_shorthands_and_params_parse() {
    let null = serde_json::Value::Null;
    assert_eq!(
        parse_reveal("wipe-right", &null).unwrap(),
        RevealKind::Wipe {
            dir: WipeDir::Right
        }
    );
    assert_eq!(
        parse_reveal("WIPE_DOWN", &null).unwrap(),
        RevealKind::Wipe { dir: WipeDir::Down }
    );
    assert_eq!(
        parse_reveal("wipe", &serde_json::json!({ "dir": "btt" })).unwrap(),
        RevealKind::Wipe { dir: WipeDir::Up }
    );
    assert_eq!(parse_reveal("circle", &null).unwrap(), RevealKind::Circle);
    assert_eq!(parse_reveal("diagonal", &null).unwrap(), RevealKind::Diagonal);
}

#[test]
fn unknown_kinds_are_configuration_errors() {
    let null = serde_json::Value::Null;
    for bad in ["", "spiral", "wipe-sideways"] {
        let err = parse_reveal(bad, &null).unwrap_err();
        assert!(err.to_string().starts_with("configuration error:"), "{bad}");
    }
    assert!(parse_reveal("wipe", &serde_json::json!([1, 2])).is_err());
}

#[test]
fn wipe_cover_shrinks_with_progress() {
    let kind = RevealKind::Wipe {
        dir: WipeDir::Right,
    };
    let full = cover_path(kind, 0.0, 200.0, 100.0).bounding_box();
    assert_eq!(full, kurbo::Rect::new(0.0, 0.0, 200.0, 100.0));
    let half = cover_path(kind, 0.5, 200.0, 100.0).bounding_box();
    assert_eq!(half, kurbo::Rect::new(0.0, 0.0, 100.0, 100.0));
    assert!(cover_path(kind, 1.0, 200.0, 100.0).elements().is_empty());

    let down = cover_path(RevealKind::Wipe { dir: WipeDir::Down }, 0.25, 200.0, 100.0);
    assert_eq!(down.bounding_box(), kurbo::Rect::new(0.0, 0.0, 200.0, 75.0));
}

#[test]
fn diagonal_cover_reaches_far_corner() {
    let early = cover_path(RevealKind::Diagonal, 0.25, 100.0, 100.0);
    assert!(early.contains(kurbo::Point::new(90.0, 90.0)));
    assert!(!early.contains(kurbo::Point::new(10.0, 10.0)));
    let late = cover_path(RevealKind::Diagonal, 0.9, 100.0, 100.0);
    assert!(late.contains(kurbo::Point::new(99.0, 99.0)));
    assert!(!late.contains(kurbo::Point::new(50.0, 50.0)));
}

#[test]
fn circle_cover_has_a_hole() {
    let path = cover_path(RevealKind::Circle, 0.1, 200.0, 100.0);
    // radius = 200 * 1.5 * 0.1 = 30 around (100, 50)
    assert!(!path.contains(kurbo::Point::new(100.0, 50.0)));
    assert!(path.contains(kurbo::Point::new(5.0, 5.0)));
    assert!(cover_path(RevealKind::Circle, 0.5, 200.0, 100.0).elements().is_empty());
}

#[test]
fn reveal_redraws_only_when_progress_changes() {
    let (surface, log) = RecordingSurface::new(50, 50);
    let color = Rgba8::rgb(0xA5, 0x74, 0x4E);
    let mut reveal = Reveal::new(RevealKind::Circle, color, Box::new(surface));
    assert!(reveal.is_dirty());
    reveal.render().unwrap();
    assert!(!reveal.is_dirty());

    reveal.set_progress(0.0);
    assert!(!reveal.is_dirty());
    reveal.set_progress(7.0);
    assert_eq!(reveal.progress(), 1.0);
    reveal.render().unwrap();

    let ops = log.borrow().ops.clone();
    let fills = ops
        .iter()
        .filter(|op| matches!(op, SurfaceOp::Fill { .. }))
        .count();
    assert_eq!(fills, 1);
    assert_eq!(ops.last(), Some(&SurfaceOp::Present));
}
