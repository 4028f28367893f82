use std::fmt;
use std::str::FromStr;

use crate::foundation::core::ElementRect;
use crate::foundation::error::{RidgelineError, RidgelineResult};

/// A position along a box, top to bottom.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Edge {
    /// 0%.
    Top,
    /// 50%.
    Center,
    /// 100%.
    Bottom,
    /// Arbitrary percentage (kept as authored so it prints back unchanged).
    Percent(f64),
}

impl Edge {
    /// Position as a fraction of the box height.
    pub fn fraction(self) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => 0.5,
            Self::Bottom => 1.0,
            Self::Percent(p) => p / 100.0,
        }
    }

    fn parse(token: &str) -> RidgelineResult<Self> {
        match token.to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "center" | "middle" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            other => {
                let pct = other.strip_suffix('%').ok_or_else(|| {
                    RidgelineError::configuration(format!("unknown anchor edge '{token}'"))
                })?;
                let v: f64 = pct.parse().map_err(|_| {
                    RidgelineError::configuration(format!(
                        "anchor edge '{token}' is not a percentage"
                    ))
                })?;
                if !v.is_finite() {
                    return Err(RidgelineError::configuration(format!(
                        "anchor edge '{token}' must be finite"
                    )));
                }
                Ok(Self::Percent(v))
            }
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Center => f.write_str("center"),
            Self::Bottom => f.write_str("bottom"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// "`<element edge> <viewport edge>`": the zone boundary is crossed when the element edge
/// meets the viewport edge, e.g. `top 80%` fires once the element's top reaches 80% of the
/// viewport height.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Anchor {
    /// Edge of the target element.
    pub element: Edge,
    /// Edge of the viewport.
    pub viewport: Edge,
}

impl Anchor {
    /// Build an anchor.
    pub const fn new(element: Edge, viewport: Edge) -> Self {
        Self { element, viewport }
    }

    /// Document scroll offset at which this boundary is crossed.
    pub fn resolve(&self, rect: &ElementRect, viewport_height: f64) -> f64 {
        rect.y_at(self.element.fraction()) - self.viewport.fraction() * viewport_height
    }
}

impl FromStr for Anchor {
    type Err = RidgelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let (Some(element), Some(viewport), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(RidgelineError::configuration(format!(
                "anchor '{s}' must be '<element edge> <viewport edge>'"
            )));
        };
        Ok(Self {
            element: Edge::parse(element)?,
            viewport: Edge::parse(viewport)?,
        })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

impl TryFrom<String> for Anchor {
    type Error = RidgelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Anchor> for String {
    fn from(value: Anchor) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trigger/anchor.rs"]
mod tests;
