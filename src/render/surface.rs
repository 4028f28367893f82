//! The drawing seam between effects and whatever canvas the host provides.

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::core::{BezPath, Rgba8};
use crate::foundation::error::{RidgelineError, RidgelineResult};

/// A 2D canvas exclusively owned by one effect instance.
///
/// Draw calls accumulate until [`Surface::present`], which publishes the frame to the host.
/// Presenting into a canvas the host has detached is a frame error.
pub trait Surface {
    /// Current pixel size.
    fn size(&self) -> (u32, u32);

    /// Match the container's box; drops the current contents.
    fn resize(&mut self, width: u32, height: u32) -> RidgelineResult<()>;

    /// Wipe the canvas to fully transparent.
    fn clear(&mut self);

    /// Fill `path` (non-zero winding) with `color`, its alpha scaled by `alpha`.
    fn fill_path(&mut self, path: &BezPath, color: Rgba8, alpha: f64);

    /// Publish the drawn frame.
    fn present(&mut self) -> RidgelineResult<()>;
}

/// One recorded surface operation.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    /// `resize(w, h)`.
    Resize(u32, u32),
    /// `clear()`.
    Clear,
    /// `fill_path(..)`, with the path's bounding box.
    Fill {
        /// Path bounds.
        bounds: kurbo::Rect,
        /// Fill color.
        color: Rgba8,
        /// Alpha factor.
        alpha: f64,
    },
    /// `present()`.
    Present,
}

/// Shared log of operations plus an attached flag the owner can flip.
#[derive(Debug)]
pub struct SurfaceLog {
    /// Operations in call order.
    pub ops: Vec<SurfaceOp>,
    /// While `false`, `present` fails.
    pub attached: bool,
}

/// Headless surface that records draw calls instead of rasterizing.
#[derive(Debug)]
pub struct RecordingSurface {
    size: (u32, u32),
    log: Rc<RefCell<SurfaceLog>>,
}

impl RecordingSurface {
    /// Create a surface and the log handle used to inspect it.
    pub fn new(width: u32, height: u32) -> (Self, Rc<RefCell<SurfaceLog>>) {
        let log = Rc::new(RefCell::new(SurfaceLog {
            ops: Vec::new(),
            attached: true,
        }));
        (
            Self {
                size: (width, height),
                log: log.clone(),
            },
            log,
        )
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) -> RidgelineResult<()> {
        self.size = (width, height);
        self.log.borrow_mut().ops.push(SurfaceOp::Resize(width, height));
        Ok(())
    }

    fn clear(&mut self) {
        self.log.borrow_mut().ops.push(SurfaceOp::Clear);
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba8, alpha: f64) {
        use kurbo::Shape;
        self.log.borrow_mut().ops.push(SurfaceOp::Fill {
            bounds: path.bounding_box(),
            color,
            alpha,
        });
    }

    fn present(&mut self) -> RidgelineResult<()> {
        let mut log = self.log.borrow_mut();
        if !log.attached {
            return Err(RidgelineError::frame("present into a detached surface"));
        }
        log.ops.push(SurfaceOp::Present);
        Ok(())
    }
}
