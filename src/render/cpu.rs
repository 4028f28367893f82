use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::core::{BezPath, Rgba8};
use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::render::surface::Surface;

/// Last presented frame of a canvas, as seen by the host page.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasBuffer {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Straight-alpha RGBA8, row-major.
    pub rgba: Vec<u8>,
    /// Number of successful presents.
    pub frames: u64,
    /// Cleared by the host when the canvas node is removed.
    pub attached: bool,
}

impl CanvasBuffer {
    fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; (width as usize) * (height as usize) * 4],
            frames: 0,
            attached: true,
        }
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ])
    }
}

/// Handle the host keeps to read and detach a canvas.
pub type SharedCanvas = Rc<RefCell<CanvasBuffer>>;

/// CPU raster surface. Fills are queued and rasterized by `vello_cpu` on present.
pub struct PixmapSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    fills: Vec<(vello_cpu::kurbo::BezPath, [u8; 4])>,
    canvas: SharedCanvas,
}

impl std::fmt::Debug for PixmapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixmapSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("queued_fills", &self.fills.len())
            .finish()
    }
}

fn dims(width: u32, height: u32) -> RidgelineResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| RidgelineError::resource_exhaustion("canvas width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| RidgelineError::resource_exhaustion("canvas height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(RidgelineError::resource_exhaustion(
            "canvas must be at least 1x1",
        ));
    }
    Ok((w, h))
}

impl PixmapSurface {
    /// Allocate a surface and the canvas handle the host keeps.
    pub fn new(width: u32, height: u32) -> RidgelineResult<(Self, SharedCanvas)> {
        let (w, h) = dims(width, height)?;
        let canvas = Rc::new(RefCell::new(CanvasBuffer::blank(width, height)));
        Ok((
            Self {
                width: w,
                height: h,
                pixmap: vello_cpu::Pixmap::new(w, h),
                fills: Vec::new(),
                canvas: canvas.clone(),
            },
            canvas,
        ))
    }
}

impl Surface for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn resize(&mut self, width: u32, height: u32) -> RidgelineResult<()> {
        let (w, h) = dims(width, height)?;
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.pixmap = vello_cpu::Pixmap::new(w, h);
            self.fills.clear();
            let mut canvas = self.canvas.borrow_mut();
            let attached = canvas.attached;
            let frames = canvas.frames;
            *canvas = CanvasBuffer {
                attached,
                frames,
                ..CanvasBuffer::blank(width, height)
            };
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.fills.clear();
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba8, alpha: f64) {
        let c = color.with_alpha_factor(alpha);
        if c.a == 0 {
            return;
        }
        self.fills.push((bezpath_to_cpu(path), [c.r, c.g, c.b, c.a]));
    }

    fn present(&mut self) -> RidgelineResult<()> {
        if !self.canvas.borrow().attached {
            self.fills.clear();
            return Err(RidgelineError::frame("present into a detached canvas"));
        }

        clear_pixmap(&mut self.pixmap);
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        for (path, [r, g, b, a]) in self.fills.drain(..) {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_path(&path);
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);

        let mut canvas = self.canvas.borrow_mut();
        let src = self.pixmap.data_as_u8_slice();
        canvas.rgba.resize(src.len(), 0);
        for (dst, px) in canvas.rgba.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
            dst.copy_from_slice(&unpremul_rgba8(px[0], px[1], px[2], px[3]));
        }
        canvas.frames += 1;
        Ok(())
    }
}

fn unpremul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let un = |c: u8| -> u8 {
        let v = (u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a);
        v.min(255) as u8
    };
    [un(r), un(g), un(b), a]
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
