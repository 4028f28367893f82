//! Timelines of eased property segments and the composer that owns them.
//!
//! A timeline's visible state is a pure function of its time cursor: sampling never reads
//! values back from the page, so direction changes are continuous by construction.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::animation::ease::Ease;
use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::foundation::ids::{IdGen, RevealId, SystemId, TimelineId};

/// What a mutation writes to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Target {
    /// A page element located by its stable marker.
    Element(String),
    /// Simulation parameters of a particle system.
    Particles(SystemId),
    /// Cover progress of a canvas reveal.
    Reveal(RevealId),
}

impl Target {
    /// Element target from a marker.
    pub fn element(marker: impl Into<String>) -> Self {
        Self::Element(marker.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(marker) => write!(f, "{marker}"),
            Self::Particles(id) => write!(f, "particles#{}", id.0),
            Self::Reveal(id) => write!(f, "reveal#{}", id.0),
        }
    }
}

/// One `(target, property, from, to)` interpolation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Mutation {
    /// Where the value goes.
    pub target: Target,
    /// Property name (`opacity`, `translateY`, `stroke-dashoffset`, `gravity`, ...).
    pub property: String,
    /// Value at local progress 0.
    pub from: f64,
    /// Value at local progress 1.
    pub to: f64,
}

impl Mutation {
    /// Build a mutation.
    pub fn new(target: Target, property: impl Into<String>, from: f64, to: f64) -> Self {
        Self {
            target,
            property: property.into(),
            from,
            to,
        }
    }

    /// Interpolated value for eased progress `e` (not clamped).
    pub fn value_at(&self, e: f64) -> f64 {
        self.from + (self.to - self.from) * e
    }
}

/// A timed, eased group of mutations inside a timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    /// Identifier, unique within its timeline by convention.
    pub id: String,
    /// Start, in seconds from the timeline start.
    pub start_offset: f64,
    /// Length in seconds; zero snaps to `to` once started.
    pub duration: f64,
    /// Easing applied to local progress.
    pub ease: Ease,
    /// Ordered mutations.
    pub mutations: Vec<Mutation>,
}

impl Segment {
    /// Build a segment with no mutations.
    pub fn new(id: impl Into<String>, start_offset: f64, duration: f64, ease: Ease) -> Self {
        Self {
            id: id.into(),
            start_offset,
            duration,
            ease,
            mutations: Vec::new(),
        }
    }

    /// Append a mutation (builder style).
    pub fn with(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Reject negative or non-finite timing.
    pub fn validate(&self) -> RidgelineResult<()> {
        if !self.start_offset.is_finite() || self.start_offset < 0.0 {
            return Err(RidgelineError::configuration(format!(
                "segment '{}' start_offset must be finite and >= 0",
                self.id
            )));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(RidgelineError::configuration(format!(
                "segment '{}' duration must be finite and >= 0",
                self.id
            )));
        }
        for m in &self.mutations {
            if !m.from.is_finite() || !m.to.is_finite() {
                return Err(RidgelineError::configuration(format!(
                    "segment '{}' mutation '{}' values must be finite",
                    self.id, m.property
                )));
            }
        }
        Ok(())
    }

    /// End time relative to the timeline start.
    pub fn end(&self) -> f64 {
        self.start_offset + self.duration
    }

    /// Local progress in `[0, 1]` at timeline time `t`.
    pub fn local_progress(&self, t: f64) -> f64 {
        if self.duration <= 0.0 {
            return if t >= self.start_offset { 1.0 } else { 0.0 };
        }
        ((t - self.start_offset) / self.duration).clamp(0.0, 1.0)
    }
}

/// Behavior when a pass reaches the end of the timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Play once and complete.
    #[default]
    None,
    /// Jump back to the start and keep going.
    Loop,
    /// Flip direction at each end.
    Yoyo,
}

impl RepeatMode {
    /// Parse a configuration name (`none`, `loop`, `yoyo`).
    pub fn from_name(name: &str) -> RidgelineResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" | "once" => Ok(Self::None),
            "loop" | "repeat" => Ok(Self::Loop),
            "yoyo" | "pingpong" | "ping_pong" => Ok(Self::Yoyo),
            other => Err(RidgelineError::configuration(format!(
                "unknown repeat mode '{other}'"
            ))),
        }
    }

    /// Canonical configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Loop => "loop",
            Self::Yoyo => "yoyo",
        }
    }

    /// `true` for modes that never complete on their own.
    pub fn is_infinite(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Transport state of a timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum PlayState {
    /// Advancing forward.
    Playing,
    /// Holding its cursor.
    Paused,
    /// Advancing backward.
    Reversed,
    /// Reached an end with nothing left to do.
    Complete,
}

/// Direction the cursor moves when running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Direction {
    /// Towards the end.
    Forward,
    /// Towards the start.
    Backward,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

/// Creation options for a timeline.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimelineConfig {
    /// Repeat behavior.
    #[serde(default)]
    pub repeat: RepeatMode,
    /// Seconds to wait before the first forward pass starts moving.
    #[serde(default)]
    pub initial_delay: f64,
    /// Free-form label used in logs.
    #[serde(default)]
    pub label: String,
}

impl TimelineConfig {
    /// Config with the given repeat mode and no delay.
    pub fn new(repeat: RepeatMode) -> Self {
        Self {
            repeat,
            ..Self::default()
        }
    }

    /// Set the initial delay (builder style).
    pub fn delayed(mut self, seconds: f64) -> Self {
        self.initial_delay = seconds;
        self
    }

    /// Set the label (builder style).
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// A value produced by sampling a timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PropertyWrite {
    /// Timeline that produced the value.
    pub source: TimelineId,
    /// Destination.
    pub target: Target,
    /// Property name.
    pub property: String,
    /// Interpolated value.
    pub value: f64,
}

/// Receives sampled values; later writes to the same key win.
pub trait PropertySink {
    /// Record one interpolated value.
    fn write(&mut self, source: TimelineId, target: &Target, property: &str, value: f64);
}

impl PropertySink for Vec<PropertyWrite> {
    fn write(&mut self, source: TimelineId, target: &Target, property: &str, value: f64) {
        self.push(PropertyWrite {
            source,
            target: target.clone(),
            property: property.to_owned(),
            value,
        });
    }
}

/// An ordered set of segments played as a unit.
#[derive(Clone, Debug)]
pub struct Timeline {
    id: TimelineId,
    label: String,
    segments: Vec<Segment>,
    order: Vec<usize>,
    sorted: bool,
    repeat: RepeatMode,
    state: PlayState,
    direction: Direction,
    cursor: f64,
    delay_remaining: f64,
    needs_apply: bool,
    frozen: bool,
}

impl Timeline {
    fn new(id: TimelineId, config: TimelineConfig, delay: f64, frozen: bool) -> Self {
        Self {
            id,
            label: config.label,
            segments: Vec::new(),
            order: Vec::new(),
            sorted: true,
            repeat: config.repeat,
            state: PlayState::Paused,
            direction: Direction::Forward,
            cursor: 0.0,
            delay_remaining: delay,
            needs_apply: false,
            frozen,
        }
    }

    /// Timeline id.
    pub fn id(&self) -> TimelineId {
        self.id
    }

    /// Label given at creation.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current transport state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Current direction of travel.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Time cursor in seconds.
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Repeat behavior.
    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// Segments in insertion (layering) order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// `true` when reduced motion froze this infinite timeline.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// `true` while the cursor is moving (or waiting out its initial delay).
    pub fn is_running(&self) -> bool {
        matches!(self.state, PlayState::Playing | PlayState::Reversed)
    }

    /// `true` when values changed since the last sample.
    pub fn needs_apply(&self) -> bool {
        self.needs_apply
    }

    /// End of the last segment, in seconds.
    pub fn duration(&self) -> f64 {
        self.segments.iter().map(Segment::end).fold(0.0, f64::max)
    }

    fn push_segment(&mut self, segment: Segment) {
        if self.is_running() || self.cursor > 0.0 {
            tracing::debug!(
                timeline = %self.label,
                segment = %segment.id,
                "segment added after playback started; elapsed portion is not replayed"
            );
        }
        self.segments.push(segment);
        self.sorted = false;
        self.needs_apply = true;
    }

    fn ensure_sorted(&mut self) {
        if self.sorted {
            return;
        }
        let mut order: Vec<usize> = (0..self.segments.len()).collect();
        // Stable: ties keep insertion order, so later-inserted segments layer on top.
        order.sort_by(|&a, &b| {
            self.segments[a]
                .start_offset
                .total_cmp(&self.segments[b].start_offset)
        });
        self.order = order;
        self.sorted = true;
    }

    /// Run forward from the cursor; restarts from 0 when sitting at the end.
    pub fn play(&mut self) {
        if self.frozen {
            tracing::debug!(timeline = %self.label, "play ignored: infinite loops disabled");
            return;
        }
        self.ensure_sorted();
        let total = self.duration();
        if total > 0.0 && self.cursor >= total {
            self.cursor = 0.0;
            self.needs_apply = true;
        }
        self.direction = Direction::Forward;
        self.state = PlayState::Playing;
    }

    /// Hold the cursor where it is.
    pub fn pause(&mut self) {
        if self.is_running() {
            self.state = PlayState::Paused;
        }
    }

    /// Run backward from the current cursor (no snap to the end state).
    pub fn reverse(&mut self) {
        if self.frozen {
            tracing::debug!(timeline = %self.label, "reverse ignored: infinite loops disabled");
            return;
        }
        self.delay_remaining = 0.0;
        self.direction = Direction::Backward;
        self.state = PlayState::Reversed;
    }

    /// Move the cursor to `time` (clamped to the timeline) and mark it for re-sampling.
    pub fn seek(&mut self, time: f64) {
        let total = self.duration();
        self.cursor = if time.is_finite() {
            time.clamp(0.0, total)
        } else {
            0.0
        };
        self.delay_remaining = 0.0;
        if self.state == PlayState::Complete {
            self.state = PlayState::Paused;
        }
        self.needs_apply = true;
    }

    /// Seek to a fraction of the total duration.
    pub fn seek_progress(&mut self, progress: f64) {
        let total = self.duration();
        self.seek(progress.clamp(0.0, 1.0) * total);
    }

    /// Advance the cursor by `dt` seconds. Returns `true` while it should keep running.
    pub fn advance(&mut self, dt: f64) -> bool {
        if !self.is_running() {
            return false;
        }

        let mut dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if self.delay_remaining > 0.0 {
            let used = dt.min(self.delay_remaining);
            self.delay_remaining -= used;
            dt -= used;
            if self.delay_remaining > 0.0 {
                return true;
            }
        }

        self.needs_apply = true;
        let total = self.duration();
        if total <= 0.0 {
            self.cursor = 0.0;
            self.state = PlayState::Complete;
            return false;
        }

        let dt = match self.repeat {
            RepeatMode::None => dt,
            RepeatMode::Loop => dt % total,
            RepeatMode::Yoyo => dt % (2.0 * total),
        };
        let mut t = self.cursor + self.direction.sign() * dt;

        loop {
            match self.direction {
                Direction::Forward if t >= total => match self.repeat {
                    RepeatMode::None => {
                        self.cursor = total;
                        self.state = PlayState::Complete;
                        return false;
                    }
                    RepeatMode::Loop => t -= total,
                    RepeatMode::Yoyo => {
                        t = 2.0 * total - t;
                        self.direction = Direction::Backward;
                        self.state = PlayState::Reversed;
                    }
                },
                Direction::Backward if t <= 0.0 => match self.repeat {
                    RepeatMode::None => {
                        self.cursor = 0.0;
                        self.state = PlayState::Complete;
                        return false;
                    }
                    RepeatMode::Loop => t += total,
                    RepeatMode::Yoyo => {
                        t = -t;
                        self.direction = Direction::Forward;
                        self.state = PlayState::Playing;
                    }
                },
                _ => break,
            }
        }

        self.cursor = t.clamp(0.0, total);
        true
    }

    /// Write every applicable mutation for the current cursor into `sink`.
    ///
    /// Segments apply in start order, ties broken by insertion order, and later writes win.
    /// A segment that has not started yet still contributes its `from` value when no earlier
    /// segment owns that property, so staggered targets hold their initial state.
    pub fn sample_into(&mut self, sink: &mut dyn PropertySink) {
        self.ensure_sorted();
        let mut touched: BTreeSet<(&Target, &str)> = BTreeSet::new();
        for &idx in &self.order {
            let seg = &self.segments[idx];
            let started = self.cursor >= seg.start_offset;
            let eased = seg.ease.apply(seg.local_progress(self.cursor));
            for m in &seg.mutations {
                let key = (&m.target, m.property.as_str());
                if started {
                    sink.write(self.id, &m.target, &m.property, m.value_at(eased));
                    touched.insert(key);
                } else if touched.insert(key) {
                    sink.write(self.id, &m.target, &m.property, m.from);
                }
            }
        }
        self.needs_apply = false;
    }

    /// Convenience: sample into a fresh vector.
    pub fn sample(&mut self) -> Vec<PropertyWrite> {
        let mut out = Vec::new();
        self.sample_into(&mut out);
        out
    }
}

/// Duration scaling and loop policy applied to every timeline at creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionScale {
    /// Multiplier applied to offsets, durations and delays.
    pub duration_scale: f64,
    /// When `false`, infinite timelines are created frozen.
    pub loops_allowed: bool,
}

impl Default for MotionScale {
    fn default() -> Self {
        Self {
            duration_scale: 1.0,
            loops_allowed: true,
        }
    }
}

/// Owns every timeline and its transport.
#[derive(Debug, Default)]
pub struct Composer {
    timelines: BTreeMap<TimelineId, Timeline>,
    ids: IdGen,
    scale: MotionScale,
}

impl Composer {
    /// Composer with the given motion policy.
    pub fn new(scale: MotionScale) -> Self {
        Self {
            timelines: BTreeMap::new(),
            ids: IdGen::default(),
            scale,
        }
    }

    /// Motion policy in effect.
    pub fn scale(&self) -> MotionScale {
        self.scale
    }

    /// Create an empty, paused timeline.
    pub fn create_timeline(&mut self, config: TimelineConfig) -> RidgelineResult<TimelineId> {
        if !config.initial_delay.is_finite() || config.initial_delay < 0.0 {
            return Err(RidgelineError::configuration(
                "timeline initial_delay must be finite and >= 0",
            ));
        }
        let id = TimelineId(self.ids.next());
        let frozen = config.repeat.is_infinite() && !self.scale.loops_allowed;
        if frozen {
            tracing::debug!(label = %config.label, "infinite timeline frozen by motion policy");
        }
        let delay = config.initial_delay * self.scale.duration_scale;
        self.timelines
            .insert(id, Timeline::new(id, config, delay, frozen));
        Ok(id)
    }

    /// Validate, scale and append a segment.
    pub fn add_segment(&mut self, id: TimelineId, mut segment: Segment) -> RidgelineResult<()> {
        segment.validate()?;
        let timeline = self.timelines.get_mut(&id).ok_or_else(|| {
            RidgelineError::configuration(format!("timeline {} does not exist", id.0))
        })?;
        segment.start_offset *= self.scale.duration_scale;
        segment.duration *= self.scale.duration_scale;
        timeline.push_segment(segment);
        Ok(())
    }

    /// Borrow a timeline.
    pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id)
    }

    /// Mutably borrow a timeline.
    pub fn get_mut(&mut self, id: TimelineId) -> Option<&mut Timeline> {
        self.timelines.get_mut(&id)
    }

    /// Start or resume forward playback. Returns `false` for unknown ids.
    pub fn play(&mut self, id: TimelineId) -> bool {
        self.with(id, Timeline::play)
    }

    /// Pause. Returns `false` for unknown ids.
    pub fn pause(&mut self, id: TimelineId) -> bool {
        self.with(id, Timeline::pause)
    }

    /// Reverse from the current cursor. Returns `false` for unknown ids.
    pub fn reverse(&mut self, id: TimelineId) -> bool {
        self.with(id, Timeline::reverse)
    }

    /// Seek to `time` seconds. Returns `false` for unknown ids.
    pub fn seek(&mut self, id: TimelineId, time: f64) -> bool {
        self.with(id, |t| t.seek(time))
    }

    /// Seek to a fraction of the duration. Returns `false` for unknown ids.
    pub fn seek_progress(&mut self, id: TimelineId, progress: f64) -> bool {
        self.with(id, |t| t.seek_progress(progress))
    }

    fn with(&mut self, id: TimelineId, f: impl FnOnce(&mut Timeline)) -> bool {
        match self.timelines.get_mut(&id) {
            Some(t) => {
                f(t);
                true
            }
            None => false,
        }
    }

    /// Advance one timeline. Returns `true` while it keeps running.
    pub fn advance(&mut self, id: TimelineId, dt: f64) -> bool {
        self.timelines
            .get_mut(&id)
            .map(|t| t.advance(dt))
            .unwrap_or(false)
    }

    /// Sample one timeline into `sink`.
    pub fn sample_into(&mut self, id: TimelineId, sink: &mut dyn PropertySink) {
        if let Some(t) = self.timelines.get_mut(&id) {
            t.sample_into(sink);
        }
    }

    /// `true` when the timeline exists and is running.
    pub fn is_running(&self, id: TimelineId) -> bool {
        self.timelines.get(&id).is_some_and(Timeline::is_running)
    }

    /// Ids of every live timeline, in creation order.
    pub fn ids(&self) -> Vec<TimelineId> {
        self.timelines.keys().copied().collect()
    }

    /// Drop a timeline. Returns `false` when it was already gone.
    pub fn kill(&mut self, id: TimelineId) -> bool {
        self.timelines.remove(&id).is_some()
    }

    /// Number of live timelines.
    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    /// `true` when no timelines are live.
    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;
