use super::*;
use kurbo::Shape;

#[test]
fn present_rasterizes_fills_into_the_canvas() {
    let (mut surface, canvas) = PixmapSurface::new(16, 16).unwrap();
    let rect = kurbo::Rect::new(0.0, 0.0, 8.0, 16.0).to_path(0.1);
    surface.fill_path(&rect, Rgba8::rgb(0xA5, 0x74, 0x4E), 1.0);
    surface.present().unwrap();

    let c = canvas.borrow();
    assert_eq!(c.frames, 1);
    assert_eq!(c.pixel(2, 8), Some([0xA5, 0x74, 0x4E, 255]));
    assert_eq!(c.pixel(12, 8), Some([0, 0, 0, 0]));
    assert_eq!(c.pixel(16, 0), None);
}

#[test]
fn clear_drops_queued_fills() {
    let (mut surface, canvas) = PixmapSurface::new(4, 4).unwrap();
    let rect = kurbo::Rect::new(0.0, 0.0, 4.0, 4.0).to_path(0.1);
    surface.fill_path(&rect, Rgba8::rgb(255, 0, 0), 1.0);
    surface.clear();
    surface.present().unwrap();
    assert!(canvas.borrow().rgba.iter().all(|&b| b == 0));
}

#[test]
fn detached_canvas_rejects_present() {
    let (mut surface, canvas) = PixmapSurface::new(4, 4).unwrap();
    canvas.borrow_mut().attached = false;
    let err = surface.present().unwrap_err();
    assert!(err.to_string().starts_with("frame error:"));
    assert_eq!(canvas.borrow().frames, 0);
}

#[test]
fn resize_reallocates_and_keeps_attachment() {
    let (mut surface, canvas) = PixmapSurface::new(4, 4).unwrap();
    surface.resize(10, 6).unwrap();
    assert_eq!(surface.size(), (10, 6));
    let c = canvas.borrow();
    assert_eq!((c.width, c.height, c.rgba.len()), (10, 6, 240));
    assert!(c.attached);
}

#[test]
fn oversized_canvas_is_resource_exhaustion() {
    let err = PixmapSurface::new(70_000, 10).unwrap_err();
    assert!(err.is_degradable());
    assert!(PixmapSurface::new(0, 10).is_err());
}
