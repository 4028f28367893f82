use super::*;

#[test]
fn hex_colors_parse_in_all_lengths() {
    assert_eq!(Rgba8::from_hex("#A5744E").unwrap(), Rgba8::rgb(0xa5, 0x74, 0x4e));
    assert_eq!(Rgba8::from_hex("#fff").unwrap(), Rgba8::rgb(255, 255, 255));
    assert_eq!(
        Rgba8::from_hex("#4D799480").unwrap(),
        Rgba8 {
            r: 0x4d,
            g: 0x79,
            b: 0x94,
            a: 0x80
        }
    );
}

#[test]
fn hex_colors_reject_garbage() {
    assert!(Rgba8::from_hex("A5744E").is_err());
    assert!(Rgba8::from_hex("#12345").is_err());
    assert!(Rgba8::from_hex("#zzzzzz").is_err());
}

#[test]
fn hex_roundtrip_is_lowercase() {
    let c = Rgba8::from_hex("#F2D275").unwrap();
    assert_eq!(c.to_hex(), "#f2d275");
}

#[test]
fn alpha_factor_is_clamped() {
    let c = Rgba8::rgb(1, 2, 3);
    assert_eq!(c.with_alpha_factor(0.5).a, 128);
    assert_eq!(c.with_alpha_factor(-1.0).a, 0);
    assert_eq!(c.with_alpha_factor(4.0).a, 255);
}

#[test]
fn element_rect_geometry() {
    let r = ElementRect::new(0.0, 1000.0, 800.0, 400.0);
    assert_eq!(r.y_at(0.0), 1000.0);
    assert_eq!(r.y_at(0.5), 1200.0);
    assert_eq!(r.surface_size(), (800, 400));
    assert_eq!(ElementRect::new(0.0, 0.0, 0.0, 0.2).surface_size(), (1, 1));
}

#[test]
fn span_validation() {
    assert!(Span::new(1.0, 2.0).validate("size").is_ok());
    assert!(Span::fixed(3.0).validate("size").is_ok());
    assert!(Span::new(2.0, 1.0).validate("size").is_err());
    assert!(Span::new(f64::NAN, 1.0).validate("size").is_err());
}

#[test]
fn stable_seed_depends_on_label() {
    assert_eq!(stable_seed(7, "a"), stable_seed(7, "a"));
    assert_ne!(stable_seed(7, "a"), stable_seed(7, "b"));
    assert_ne!(stable_seed(7, "a"), stable_seed(8, "a"));
}
