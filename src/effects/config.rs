//! The public effect configuration surface and its allow-list validation.

use std::fmt;

use crate::animation::ease::Ease;
use crate::animation::timeline::RepeatMode;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::particles::system::MAX_PARTICLES;
use crate::trigger::anchor::Anchor;
use crate::trigger::scheduler::{ZoneMode, ZoneSpec};

/// Largest accepted `duration_multiplier`.
pub const MAX_DURATION_MULTIPLIER: f64 = 10.0;

/// Effect classes known to [`crate::Stage::init_effect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum EffectKind {
    /// Canvas particle burst on zone enter.
    ParticleBurst,
    /// Solid canvas cover cut away by progress.
    CanvasReveal,
    /// SVG stroke drawn on by animating its dash offset.
    PathDraw,
    /// Scroll-scrubbed translation.
    Parallax,
    /// Freestanding infinite yoyo loop.
    Breathing,
    /// Staggered fade/slide-in of several targets.
    StaggerReveal,
    /// Slow canvas particles that bounce inside the canvas until torn down.
    AmbientField,
    /// Element that trails the pointer, e.g. a cursor ring.
    PointerFollow,
    /// Layers nudged away from center by the pointer's position over a region.
    PointerDrift,
}

impl EffectKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::ParticleBurst,
        Self::CanvasReveal,
        Self::PathDraw,
        Self::Parallax,
        Self::Breathing,
        Self::StaggerReveal,
        Self::AmbientField,
        Self::PointerFollow,
        Self::PointerDrift,
    ];

    /// Parse an effect name or alias (case-insensitive, `_` and `-` interchangeable).
    pub fn from_name(name: &str) -> RidgelineResult<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "particle-burst" | "particles" | "burst" => Ok(Self::ParticleBurst),
            "canvas-reveal" | "reveal" => Ok(Self::CanvasReveal),
            "path-draw" | "svg-draw" | "draw" => Ok(Self::PathDraw),
            "parallax" => Ok(Self::Parallax),
            "breathing" | "breathe" => Ok(Self::Breathing),
            "stagger-reveal" | "stagger" | "word-reveal" => Ok(Self::StaggerReveal),
            "ambient-field" | "particle-field" | "ambient" => Ok(Self::AmbientField),
            "pointer-follow" | "cursor-ring" | "cursor" => Ok(Self::PointerFollow),
            "pointer-drift" | "fog-drift" | "drift" => Ok(Self::PointerDrift),
            other => Err(RidgelineError::configuration(format!(
                "unknown effect '{other}'"
            ))),
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::ParticleBurst => "particle-burst",
            Self::CanvasReveal => "canvas-reveal",
            Self::PathDraw => "path-draw",
            Self::Parallax => "parallax",
            Self::Breathing => "breathing",
            Self::StaggerReveal => "stagger-reveal",
            Self::AmbientField => "ambient-field",
            Self::PointerFollow => "pointer-follow",
            Self::PointerDrift => "pointer-drift",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn default_mode() -> String {
    ZoneMode::OneShot.name().to_owned()
}

fn default_multiplier() -> f64 {
    1.0
}

/// Scroll trigger in config notation: anchors as `"<element edge> <viewport edge>"`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TriggerConfig {
    /// Start anchor, e.g. `"top 80%"`.
    pub start: String,
    /// Optional end anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// `one_shot`, `scrub` or `toggle`.
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl TriggerConfig {
    /// Trigger starting at `start` with no end anchor.
    pub fn new(start: impl Into<String>, mode: ZoneMode) -> Self {
        Self {
            start: start.into(),
            end: None,
            mode: mode.name().to_owned(),
        }
    }

    /// Set the end anchor.
    pub fn until(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Parse into a zone bound to `target`.
    pub fn to_zone(&self, id: &str, target: &str) -> RidgelineResult<ZoneSpec> {
        let start: Anchor = self.start.parse()?;
        let end = self.end.as_deref().map(str::parse::<Anchor>).transpose()?;
        let mode = ZoneMode::from_name(&self.mode)?;
        Ok(ZoneSpec {
            id: id.to_owned(),
            target: target.to_owned(),
            start,
            end,
            mode,
        })
    }

    /// Config form of a registered zone.
    pub fn from_zone(zone: &ZoneSpec) -> Self {
        Self {
            start: zone.start.to_string(),
            end: zone.end.map(|a| a.to_string()),
            mode: zone.mode.name().to_owned(),
        }
    }
}

/// Per-effect configuration as supplied by page glue.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectConfig {
    /// Section the effect belongs to (teardown unit).
    pub section: String,
    /// Marker of the element the effect animates or draws over.
    pub target: String,
    /// Scroll trigger; each effect has a default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerConfig>,
    /// Particle count (`1..=2000`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub particle_count: Option<u32>,
    /// Ordered `#rrggbb` colors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub palette: Vec<String>,
    /// Scales every authored duration, in `(0, 10]`.
    #[serde(default = "default_multiplier")]
    pub duration_multiplier: f64,
    /// Easing name, e.g. `power2.out`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<String>,
    /// `none`, `loop` or `yoyo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<String>,
    /// Effect-specific parameters.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

impl EffectConfig {
    /// Minimal config with every option at its default.
    pub fn new(section: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            target: target.into(),
            trigger: None,
            particle_count: None,
            palette: Vec::new(),
            duration_multiplier: 1.0,
            ease: None,
            repeat: None,
            params: serde_json::Value::Null,
        }
    }

    /// Set the scroll trigger.
    pub fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Set the particle count.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = Some(count);
        self
    }

    /// Set the palette from `#rrggbb` strings.
    pub fn with_palette<S: Into<String>>(mut self, colors: impl IntoIterator<Item = S>) -> Self {
        self.palette = colors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the duration multiplier.
    pub fn with_duration_multiplier(mut self, multiplier: f64) -> Self {
        self.duration_multiplier = multiplier;
        self
    }

    /// Set the easing name.
    pub fn with_ease(mut self, ease: impl Into<String>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    /// Set the repeat mode name.
    pub fn with_repeat(mut self, repeat: impl Into<String>) -> Self {
        self.repeat = Some(repeat.into());
        self
    }

    /// Set the effect-specific parameters.
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// Validate every option against its allow-list.
    pub fn resolve(&self, kind: EffectKind) -> RidgelineResult<ResolvedEffect> {
        if self.section.trim().is_empty() {
            return Err(RidgelineError::configuration("effect section must be non-empty"));
        }
        if self.target.trim().is_empty() {
            return Err(RidgelineError::configuration("effect target must be non-empty"));
        }

        let particle_count = match self.particle_count {
            None => None,
            Some(n) if (1..=MAX_PARTICLES).contains(&(n as usize)) => Some(n as usize),
            Some(n) => {
                return Err(RidgelineError::configuration(format!(
                    "particle_count {n} is outside 1..={MAX_PARTICLES}"
                )));
            }
        };

        let palette = self
            .palette
            .iter()
            .map(|c| Rgba8::from_hex(c))
            .collect::<RidgelineResult<Vec<_>>>()?;

        let m = self.duration_multiplier;
        if !m.is_finite() || m <= 0.0 || m > MAX_DURATION_MULTIPLIER {
            return Err(RidgelineError::configuration(format!(
                "duration_multiplier {m} is outside (0, {MAX_DURATION_MULTIPLIER}]"
            )));
        }

        let ease = self.ease.as_deref().map(Ease::from_name).transpose()?;
        let repeat = self
            .repeat
            .as_deref()
            .map(RepeatMode::from_name)
            .transpose()?;

        if !(self.params.is_null() || self.params.is_object()) {
            return Err(RidgelineError::configuration("params must be an object"));
        }

        let zone = match &self.trigger {
            None => None,
            Some(t) => {
                let zone = t.to_zone(&format!("{kind}:{}", self.target), &self.target)?;
                if zone.mode == ZoneMode::Scrub && zone.end.is_none() {
                    return Err(RidgelineError::configuration(
                        "scrub triggers need an end anchor",
                    ));
                }
                Some(zone)
            }
        };

        Ok(ResolvedEffect {
            kind,
            particle_count,
            palette,
            duration_multiplier: m,
            ease,
            repeat,
            zone,
        })
    }
}

/// An [`EffectConfig`] after validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEffect {
    /// Effect class the config was resolved for.
    pub kind: EffectKind,
    /// Particle count, when configured.
    pub particle_count: Option<usize>,
    /// Parsed palette; empty means the effect's default colors.
    pub palette: Vec<Rgba8>,
    /// Validated duration multiplier.
    pub duration_multiplier: f64,
    /// Ease override.
    pub ease: Option<Ease>,
    /// Repeat override.
    pub repeat: Option<RepeatMode>,
    /// Explicit trigger, when configured.
    pub zone: Option<ZoneSpec>,
}

/// Typed access to the `params` object.
pub(crate) struct Params<'a>(Option<&'a serde_json::Map<String, serde_json::Value>>);

impl<'a> Params<'a> {
    pub(crate) fn new(value: &'a serde_json::Value) -> Self {
        Self(value.as_object())
    }

    fn get(&self, key: &str) -> Option<&'a serde_json::Value> {
        self.0.and_then(|m| m.get(key))
    }

    fn invalid(key: &str, kind: &str) -> RidgelineError {
        RidgelineError::configuration(format!("params.{key} must be {kind}"))
    }

    pub(crate) fn f64_or(&self, key: &str, default: f64) -> RidgelineResult<f64> {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => Ok(default),
            Some(v) => v
                .as_f64()
                .filter(|f| f.is_finite())
                .ok_or_else(|| Self::invalid(key, "a number")),
        }
    }

    pub(crate) fn str_or(&self, key: &str, default: &'a str) -> RidgelineResult<&'a str> {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => Ok(default),
            Some(v) => v
                .as_str()
                .ok_or_else(|| Self::invalid(key, "a string")),
        }
    }

    pub(crate) fn opt_str(&self, key: &str) -> RidgelineResult<Option<&'a str>> {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| Self::invalid(key, "a string")),
        }
    }

    pub(crate) fn bool_or(&self, key: &str, default: bool) -> RidgelineResult<bool> {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => Ok(default),
            Some(v) => v
                .as_bool()
                .ok_or_else(|| Self::invalid(key, "a boolean")),
        }
    }

    pub(crate) fn array(&self, key: &str) -> RidgelineResult<Option<&'a Vec<serde_json::Value>>> {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => v
                .as_array()
                .map(Some)
                .ok_or_else(|| Self::invalid(key, "an array")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/config.rs"]
mod tests;
