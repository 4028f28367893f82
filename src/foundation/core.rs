use crate::foundation::error::{RidgelineError, RidgelineResult};

pub use kurbo::{BezPath, Point, Vec2};

/// Straight-alpha RGBA8 color, as authored in effect palettes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> RidgelineResult<Self> {
        let hex = s.trim().strip_prefix('#').ok_or_else(|| {
            RidgelineError::configuration(format!("color '{s}' must start with '#'"))
        })?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RidgelineError::configuration(format!(
                "color '{s}' has non-hex digits"
            )));
        }

        let byte = |i: usize| -> RidgelineResult<u8> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| RidgelineError::configuration(format!("color '{s}': {e}")))
        };
        match hex.len() {
            3 => {
                let nib = |i: usize| -> RidgelineResult<u8> {
                    let v = u8::from_str_radix(&hex[i..i + 1], 16)
                        .map_err(|e| RidgelineError::configuration(format!("color '{s}': {e}")))?;
                    Ok(v * 17)
                };
                Ok(Self::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(RidgelineError::configuration(format!(
                "color '{s}' must have 3, 6 or 8 hex digits"
            ))),
        }
    }

    /// Lowercase `#rrggbb` (or `#rrggbbaa` when not opaque).
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Scale alpha by `factor` (clamped to `[0, 1]`).
    pub fn with_alpha_factor(self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            a: (f64::from(self.a) * f).round().clamp(0.0, 255.0) as u8,
            ..self
        }
    }
}

/// Page-space bounding box of a marked element, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementRect {
    /// Distance from the top of the document.
    pub top: f64,
    /// Distance from the left of the document.
    pub left: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
}

impl ElementRect {
    /// Build a rect from its top-left corner and size.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Page-space y of a point `fraction` of the way down the box.
    pub fn y_at(&self, fraction: f64) -> f64 {
        self.top + self.height * fraction
    }

    /// Integral surface size for a canvas filling this box (at least 1x1).
    pub fn surface_size(&self) -> (u32, u32) {
        let w = self.width.round().clamp(1.0, f64::from(u16::MAX)) as u32;
        let h = self.height.round().clamp(1.0, f64::from(u16::MAX)) as u32;
        (w, h)
    }
}

/// Inclusive `[min, max]` range sampled for randomized particle attributes.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Span {
    /// Build a span; bounds are validated by [`Span::validate`].
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Span with `min == max`.
    pub const fn fixed(v: f64) -> Self {
        Self { min: v, max: v }
    }

    /// Reject non-finite bounds or `min > max`.
    pub fn validate(&self, what: &str) -> RidgelineResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(RidgelineError::configuration(format!(
                "{what} bounds must be finite"
            )));
        }
        if self.min > self.max {
            return Err(RidgelineError::configuration(format!(
                "{what} min must be <= max"
            )));
        }
        Ok(())
    }
}

/// Seeded FNV-1a over a label, used to derive per-effect RNG seeds.
pub(crate) fn stable_seed(seed: u64, label: &str) -> u64 {
    let mut h = 0xcbf2_9ce4_8422_2325u64 ^ seed;
    for &b in label.as_bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01B3);
    }
    h
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
