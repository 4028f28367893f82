use std::fmt;

use crate::foundation::error::{RidgelineError, RidgelineResult};

/// Control points of a CSS-style `cubic-bezier(x1, y1, x2, y2)` timing curve.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CubicBezier {
    /// First control point x, in `[0, 1]`.
    pub x1: f64,
    /// First control point y (may overshoot).
    pub y1: f64,
    /// Second control point x, in `[0, 1]`.
    pub x2: f64,
    /// Second control point y (may overshoot).
    pub y2: f64,
}

impl CubicBezier {
    fn coord(a1: f64, a2: f64, s: f64) -> f64 {
        // B(s) with P0 = 0 and P3 = 1.
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a1 + 3.0 * inv * s * s * a2 + s * s * s
    }

    fn coord_deriv(a1: f64, a2: f64, s: f64) -> f64 {
        let inv = 1.0 - s;
        3.0 * inv * inv * a1 + 6.0 * inv * s * (a2 - a1) + 3.0 * s * s * (1.0 - a2)
    }

    fn solve_s(&self, x: f64) -> f64 {
        let mut s = x;
        for _ in 0..8 {
            let err = Self::coord(self.x1, self.x2, s) - x;
            if err.abs() < 1e-9 {
                return s;
            }
            let d = Self::coord_deriv(self.x1, self.x2, s);
            if d.abs() < 1e-9 {
                break;
            }
            s -= err / d;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        s = x;
        for _ in 0..64 {
            let v = Self::coord(self.x1, self.x2, s);
            if (v - x).abs() < 1e-9 {
                break;
            }
            if v < x {
                lo = s;
            } else {
                hi = s;
            }
            s = 0.5 * (lo + hi);
        }
        s
    }

    /// Evaluate the curve's y for time `x` in `[0, 1]`.
    pub fn apply(&self, x: f64) -> f64 {
        let s = self.solve_s(x);
        Self::coord(self.y1, self.y2, s)
    }
}

/// Easing functions used to map normalized animation progress.
///
/// Input progress is clamped to `[0, 1]`; the output is not, so `Back*`, `OutElastic` and
/// overshooting cubic-bezier curves leave `[0, 1]` mid-flight.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Quadratic ease-in (`power1.in`).
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in (`power2.in`).
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
    /// Quartic ease-in (`power3.in`).
    InQuart,
    /// Quartic ease-out.
    OutQuart,
    /// Quartic ease-in/out.
    InOutQuart,
    /// Quintic ease-in (`power4.in`).
    InQuint,
    /// Quintic ease-out.
    OutQuint,
    /// Quintic ease-in/out.
    InOutQuint,
    /// Sinusoidal ease-in.
    InSine,
    /// Sinusoidal ease-out.
    OutSine,
    /// Sinusoidal ease-in/out.
    InOutSine,
    /// Exponential ease-in.
    InExpo,
    /// Exponential ease-out.
    OutExpo,
    /// Exponential ease-in/out.
    InOutExpo,
    /// Anticipating ease-in (dips below 0).
    InBack,
    /// Overshooting ease-out (rises above 1).
    OutBack,
    /// Anticipate and overshoot.
    InOutBack,
    /// Springy ease-out oscillating around 1.
    OutElastic,
    /// Custom timing curve.
    CubicBezier(CubicBezier),
}

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;

const NAMED: &[(&str, Ease)] = &[
    ("linear", Ease::Linear),
    ("power1.in", Ease::InQuad),
    ("power1.out", Ease::OutQuad),
    ("power1.inOut", Ease::InOutQuad),
    ("power2.in", Ease::InCubic),
    ("power2.out", Ease::OutCubic),
    ("power2.inOut", Ease::InOutCubic),
    ("power3.in", Ease::InQuart),
    ("power3.out", Ease::OutQuart),
    ("power3.inOut", Ease::InOutQuart),
    ("power4.in", Ease::InQuint),
    ("power4.out", Ease::OutQuint),
    ("power4.inOut", Ease::InOutQuint),
    ("sine.in", Ease::InSine),
    ("sine.out", Ease::OutSine),
    ("sine.inOut", Ease::InOutSine),
    ("expo.in", Ease::InExpo),
    ("expo.out", Ease::OutExpo),
    ("expo.inOut", Ease::InOutExpo),
    ("back.in", Ease::InBack),
    ("back.out", Ease::OutBack),
    ("back.inOut", Ease::InOutBack),
    ("elastic.out", Ease::OutElastic),
];

impl Ease {
    /// Apply this easing function to normalized progress `t` (clamped to `[0, 1]`).
    pub fn apply(self, t: f64) -> f64 {
        use std::f64::consts::PI;

        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InQuart => t.powi(4),
            Self::OutQuart => 1.0 - (1.0 - t).powi(4),
            Self::InOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(4) / 2.0)
                }
            }
            Self::InQuint => t.powi(5),
            Self::OutQuint => 1.0 - (1.0 - t).powi(5),
            Self::InOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(5) / 2.0)
                }
            }
            Self::InSine => 1.0 - (t * PI / 2.0).cos(),
            Self::OutSine => (t * PI / 2.0).sin(),
            Self::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::InExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            Self::OutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::InOutExpo => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Self::InBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Self::OutBack => {
                1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
            }
            Self::InOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0)
                        / 2.0
                }
            }
            Self::OutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Self::CubicBezier(curve) => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    curve.apply(t)
                }
            }
        }
    }

    /// Resolve an easing name from the configuration allow-list.
    ///
    /// Accepts the `family.variant` names (`power2.inOut`, `back.out`, ...), bare family
    /// names (meaning `.out`), `none` as an alias of `linear`, and
    /// `cubic-bezier(x1, y1, x2, y2)`.
    pub fn from_name(name: &str) -> RidgelineResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RidgelineError::configuration("ease name must be non-empty"));
        }

        if let Some(args) = name
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_cubic_bezier(args);
        }

        if name.eq_ignore_ascii_case("none") {
            return Ok(Self::Linear);
        }

        let full = if name.contains('.') || name.eq_ignore_ascii_case("linear") {
            name.to_owned()
        } else {
            format!("{name}.out")
        };

        NAMED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(&full))
            .map(|(_, ease)| *ease)
            .ok_or_else(|| RidgelineError::configuration(format!("unknown ease '{name}'")))
    }

    /// Canonical configuration name; `Ease::from_name(&e.name())` yields `e`.
    pub fn name(&self) -> String {
        if let Self::CubicBezier(c) = self {
            return format!("cubic-bezier({}, {}, {}, {})", c.x1, c.y1, c.x2, c.y2);
        }
        NAMED
            .iter()
            .find(|(_, e)| e == self)
            .map(|(n, _)| (*n).to_owned())
            .unwrap_or_else(|| "linear".to_owned())
    }
}

impl Default for Ease {
    fn default() -> Self {
        Self::Linear
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn parse_cubic_bezier(args: &str) -> RidgelineResult<Ease> {
    let values = args
        .split(',')
        .map(str::trim)
        .map(|v| {
            v.parse::<f64>().map_err(|_| {
                RidgelineError::configuration(format!(
                    "cubic-bezier argument '{v}' is not a number"
                ))
            })
        })
        .collect::<RidgelineResult<Vec<_>>>()?;

    let [x1, y1, x2, y2] = values[..] else {
        return Err(RidgelineError::configuration(
            "cubic-bezier takes exactly four arguments",
        ));
    };
    if !values.iter().all(|v| v.is_finite()) {
        return Err(RidgelineError::configuration(
            "cubic-bezier arguments must be finite",
        ));
    }
    if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
        return Err(RidgelineError::configuration(
            "cubic-bezier x coordinates must be in [0, 1]",
        ));
    }
    Ok(Ease::CubicBezier(CubicBezier { x1, y1, x2, y2 }))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
