use crate::foundation::core::{BezPath, Point, Rgba8};
use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::render::surface::Surface;

/// Side the cover retracts toward as progress goes from 0 to 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipeDir {
    /// Uncovered area grows from the right edge.
    Right,
    /// Uncovered area grows from the left edge.
    Left,
    /// Uncovered area grows from the bottom edge.
    Down,
    /// Uncovered area grows from the top edge.
    Up,
}

/// Cover shape of a canvas reveal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RevealKind {
    /// Hole opening from the center; radius reaches `1.5 * max(w, h)` at progress 1.
    Circle,
    /// Straight edge sweeping across the canvas.
    Wipe {
        /// Direction the cover retracts toward.
        dir: WipeDir,
    },
    /// Corner cut growing from the top-left along the diagonal.
    Diagonal,
}

fn parse_dir(s: &str) -> RidgelineResult<WipeDir> {
    match s.trim().to_ascii_lowercase().as_str() {
        "right" | "left_to_right" | "ltr" => Ok(WipeDir::Right),
        "left" | "right_to_left" | "rtl" => Ok(WipeDir::Left),
        "down" | "top_to_bottom" | "ttb" => Ok(WipeDir::Down),
        "up" | "bottom_to_top" | "btt" => Ok(WipeDir::Up),
        other => Err(RidgelineError::configuration(format!(
            "unknown wipe dir '{other}'"
        ))),
    }
}

/// Parse a reveal kind. `wipe` reads its direction from `params.dir`; `wipe-right`,
/// `wipe-down` and friends are shorthands.
pub fn parse_reveal(kind: &str, params: &serde_json::Value) -> RidgelineResult<RevealKind> {
    let kind = kind.trim().to_ascii_lowercase().replace('_', "-");
    if kind.is_empty() {
        return Err(RidgelineError::configuration("reveal kind must be non-empty"));
    }

    match kind.as_str() {
        "circle" => Ok(RevealKind::Circle),
        "diagonal" => Ok(RevealKind::Diagonal),
        "wipe" => {
            let params = if params.is_null() {
                None
            } else {
                Some(params.as_object().ok_or_else(|| {
                    RidgelineError::configuration("reveal params must be an object")
                })?)
            };
            let dir = match params.and_then(|p| p.get("dir")).and_then(|v| v.as_str()) {
                None => WipeDir::Right,
                Some(s) => parse_dir(s)?,
            };
            Ok(RevealKind::Wipe { dir })
        }
        other => match other.strip_prefix("wipe-") {
            Some(dir) => Ok(RevealKind::Wipe {
                dir: parse_dir(dir)?,
            }),
            None => Err(RidgelineError::configuration(format!(
                "unknown reveal kind '{other}'"
            ))),
        },
    }
}

fn polygon(points: &[(f64, f64)]) -> BezPath {
    let mut path = BezPath::new();
    let mut it = points.iter();
    if let Some(&(x, y)) = it.next() {
        path.move_to(Point::new(x, y));
        for &(x, y) in it {
            path.line_to(Point::new(x, y));
        }
        path.close_path();
    }
    path
}

const CIRCLE_SEGMENTS: usize = 96;

/// Region still covered at `progress` on a `width x height` canvas. Empty at progress 1.
pub fn cover_path(kind: RevealKind, progress: f64, width: f64, height: f64) -> BezPath {
    let p = progress.clamp(0.0, 1.0);
    let (w, h) = (width, height);
    if p >= 1.0 && !matches!(kind, RevealKind::Circle) {
        return BezPath::new();
    }

    match kind {
        RevealKind::Wipe { dir } => match dir {
            WipeDir::Right => {
                let x = w * (1.0 - p);
                polygon(&[(0.0, 0.0), (x, 0.0), (x, h), (0.0, h)])
            }
            WipeDir::Left => polygon(&[(w * p, 0.0), (w, 0.0), (w, h), (w * p, h)]),
            WipeDir::Down => {
                let y = h * (1.0 - p);
                polygon(&[(0.0, 0.0), (w, 0.0), (w, y), (0.0, y)])
            }
            WipeDir::Up => polygon(&[(0.0, h * p), (w, h * p), (w, h), (0.0, h)]),
        },
        RevealKind::Diagonal => {
            let s = 2.0 * p;
            if s <= 1.0 {
                polygon(&[(s * w, 0.0), (w, 0.0), (w, h), (0.0, h), (0.0, s * h)])
            } else {
                polygon(&[(w, h * (s - 1.0)), (w, h), (w * (s - 1.0), h)])
            }
        }
        RevealKind::Circle => {
            let radius = w.max(h) * 1.5 * p;
            let diag = (w * w + h * h).sqrt() / 2.0;
            if radius >= diag {
                return BezPath::new();
            }
            let mut path = polygon(&[(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]);
            if radius > 0.0 {
                // Opposite winding to the outer rect so the hole is unfilled.
                let (cx, cy) = (w / 2.0, h / 2.0);
                for i in 0..=CIRCLE_SEGMENTS {
                    let a = -(i as f64) * std::f64::consts::TAU / CIRCLE_SEGMENTS as f64;
                    let pt = Point::new(cx + radius * a.cos(), cy + radius * a.sin());
                    if i == 0 {
                        path.move_to(pt);
                    } else {
                        path.line_to(pt);
                    }
                }
                path.close_path();
            }
            path
        }
    }
}

/// A solid cover over a section, cut away as progress advances.
pub struct Reveal {
    kind: RevealKind,
    color: Rgba8,
    progress: f64,
    dirty: bool,
    surface: Box<dyn Surface>,
}

impl std::fmt::Debug for Reveal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reveal")
            .field("kind", &self.kind)
            .field("color", &self.color)
            .field("progress", &self.progress)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Reveal {
    /// Fully covered reveal; the first render paints the cover.
    pub fn new(kind: RevealKind, color: Rgba8, surface: Box<dyn Surface>) -> Self {
        Self {
            kind,
            color,
            progress: 0.0,
            dirty: true,
            surface,
        }
    }

    /// Cover shape.
    pub fn kind(&self) -> RevealKind {
        self.kind
    }

    /// Revealed fraction in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// `true` when progress changed since the last render.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set progress (clamped); marks the reveal for redraw when it changed.
    pub fn set_progress(&mut self, progress: f64) {
        if !progress.is_finite() {
            return;
        }
        let p = progress.clamp(0.0, 1.0);
        if p != self.progress {
            self.progress = p;
            self.dirty = true;
        }
    }

    /// Match the container box and schedule a redraw.
    pub fn resize(&mut self, width: u32, height: u32) -> RidgelineResult<()> {
        self.surface.resize(width, height)?;
        self.dirty = true;
        Ok(())
    }

    /// Redraw the cover and present it.
    pub fn render(&mut self) -> RidgelineResult<()> {
        let (w, h) = self.surface.size();
        self.surface.clear();
        let path = cover_path(self.kind, self.progress, f64::from(w), f64::from(h));
        if !path.elements().is_empty() {
            self.surface.fill_path(&path, self.color, 1.0);
        }
        self.dirty = false;
        self.surface.present()
    }

    /// Wipe the canvas (teardown).
    pub fn clear(&mut self) {
        self.surface.clear();
        if let Err(err) = self.surface.present() {
            tracing::debug!(error = %err, "reveal canvas already detached");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/reveal.rs"]
mod tests;
