//! Values that chase the pointer: a lagging cursor ring and layered drift.
//!
//! Unlike timelines, a follower has no fixed end value. Its goal moves whenever the pointer
//! (or the scrolled region under it) does, and it only asks for frames until it settles.

use crate::animation::ease::Ease;
use crate::foundation::core::{Point, Vec2};
use crate::foundation::frame::{FrameHandle, FrameOwner, FrameScheduler};
use crate::foundation::ids::FollowerId;
use crate::host::LayoutSource;
use crate::viewport::tracker::Viewport;

/// Distance under which a lerping value snaps onto its goal, in px.
pub const SETTLE_PX: f64 = 0.05;

/// Frame rate lerp factors are authored against.
const LERP_HZ: f64 = 60.0;

/// How the current value approaches its goal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Chase {
    /// Close `factor` of the remaining gap every 60 Hz frame, independent of the real rate.
    Lerp {
        /// Fraction of the gap closed per reference frame, in `(0, 1]`.
        factor: f64,
    },
    /// Tween from the current value to each new goal.
    Tween {
        /// Seconds per retarget.
        duration: f64,
        /// Curve of every tween.
        ease: Ease,
    },
}

/// How a pointer position maps to a goal.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// The goal is the pointer itself, in viewport pixels. A leave keeps the last goal.
    Track,
    /// The goal is the pointer's offset from the center of `region`'s visible box, normalized
    /// to `[-1, 1]` per axis and scaled by `intensity`. Zero outside the box or after a leave.
    Drift {
        /// Marker of the element whose box the pointer is measured against.
        region: String,
        /// Offset in px at the box edge.
        intensity: f64,
    },
}

/// One element translated toward a pointer-derived goal.
#[derive(Debug)]
pub struct Follower {
    id: FollowerId,
    target: String,
    response: Response,
    chase: Chase,
    current: Vec2,
    from: Vec2,
    goal: Vec2,
    elapsed: f64,
    dirty: bool,
    frame: Option<FrameHandle>,
}

impl Follower {
    /// A follower resting at the origin.
    pub fn new(
        id: FollowerId,
        target: impl Into<String>,
        response: Response,
        chase: Chase,
    ) -> Self {
        Self {
            id,
            target: target.into(),
            response,
            chase,
            current: Vec2::ZERO,
            from: Vec2::ZERO,
            goal: Vec2::ZERO,
            elapsed: 0.0,
            dirty: false,
            frame: None,
        }
    }

    /// Stage-assigned id.
    pub fn id(&self) -> FollowerId {
        self.id
    }

    /// Marker of the translated element.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Offset last computed, in px.
    pub fn current(&self) -> Vec2 {
        self.current
    }

    /// Offset being approached, in px.
    pub fn goal(&self) -> Vec2 {
        self.goal
    }

    /// `true` once the goal is reached.
    pub fn is_settled(&self) -> bool {
        self.current == self.goal
    }

    /// Pending frame request, if any.
    pub fn frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    /// Goal for a pointer position, given the current scroll and layout.
    pub fn goal_for(
        &self,
        pointer: Option<Point>,
        viewport: &Viewport,
        layout: &dyn LayoutSource,
    ) -> Vec2 {
        match &self.response {
            Response::Track => pointer.map_or(self.goal, Point::to_vec2),
            Response::Drift { region, intensity } => {
                let (Some(p), Some(rect)) = (pointer, layout.element_rect(region)) else {
                    return Vec2::ZERO;
                };
                let x = (p.x - rect.left) / rect.width;
                let y = (p.y - (rect.top - viewport.scroll_y)) / rect.height;
                if !((0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y)) {
                    return Vec2::ZERO;
                }
                Vec2::new((x - 0.5) * 2.0, (y - 0.5) * 2.0) * *intensity
            }
        }
    }

    /// Aim at `goal`. Tweens restart from the current value.
    pub fn retarget(&mut self, goal: Vec2) {
        if goal == self.goal {
            return;
        }
        self.from = self.current;
        self.goal = goal;
        self.elapsed = 0.0;
    }

    /// Move toward the goal by `dt` seconds. Returns `true` when the value changed.
    pub fn advance(&mut self, dt: f64) -> bool {
        if self.is_settled() || !dt.is_finite() || dt <= 0.0 {
            return false;
        }
        let next = match self.chase {
            Chase::Lerp { factor } => {
                let k = 1.0 - (1.0 - factor).powf(dt * LERP_HZ);
                let next = self.current + (self.goal - self.current) * k;
                if (self.goal - next).hypot() < SETTLE_PX {
                    self.goal
                } else {
                    next
                }
            }
            Chase::Tween { duration, ease } => {
                self.elapsed = (self.elapsed + dt).min(duration);
                if self.elapsed >= duration {
                    self.goal
                } else {
                    self.from + (self.goal - self.from) * ease.apply(self.elapsed / duration)
                }
            }
        };
        let moved = next != self.current;
        self.current = next;
        self.dirty |= moved;
        moved
    }

    /// The value to write, once per change.
    pub fn take_write(&mut self) -> Option<Vec2> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.current)
    }

    /// Request the next frame while the goal is not reached.
    pub fn ensure_scheduled(&mut self, frames: &mut FrameScheduler) {
        if !self.is_settled() && self.frame.is_none() {
            self.frame = Some(frames.request(FrameOwner::Follower(self.id)));
        }
    }

    /// Forget the request that was just delivered.
    pub(crate) fn frame_fired(&mut self) {
        self.frame = None;
    }

    /// Cancel the pending frame, if any.
    pub fn cancel(&mut self, frames: &mut FrameScheduler) {
        if let Some(handle) = self.frame.take() {
            frames.cancel(handle);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/follow.rs"]
mod tests;
