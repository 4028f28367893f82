//! Scroll-position zones with enter/leave/update transitions.

use std::collections::BTreeMap;

use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::host::LayoutSource;
use crate::trigger::anchor::Anchor;
use crate::viewport::tracker::Viewport;

/// How a zone reacts to scroll position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneMode {
    /// Fires enter once, then leave once when the end is passed; never fires again. Without an
    /// end boundary only enter fires.
    #[default]
    OneShot,
    /// Reports continuous progress between start and end.
    Scrub,
    /// Enters on a forward start crossing, leaves on a backward one.
    Toggle,
}

impl ZoneMode {
    /// Parse a mode name (`one_shot`, `scrub`, `toggle` and a few aliases).
    pub fn from_name(name: &str) -> RidgelineResult<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "one_shot" | "oneshot" | "once" => Ok(Self::OneShot),
            "scrub" => Ok(Self::Scrub),
            "toggle" => Ok(Self::Toggle),
            other => Err(RidgelineError::configuration(format!(
                "unknown trigger mode '{other}'"
            ))),
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::OneShot => "one_shot",
            Self::Scrub => "scrub",
            Self::Toggle => "toggle",
        }
    }
}

/// Per-zone lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum ZoneState {
    /// Before the start boundary.
    Idle,
    /// Enter fired this pass; becomes `Active` on the next one.
    Entering,
    /// Inside the zone.
    Active,
    /// Leave fired this pass; settles to `Done` or `Idle`.
    Exiting,
    /// Past the end (terminal for one-shot zones).
    Done,
}

/// A declarative scroll zone.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZoneSpec {
    /// Stable name used in events and logs.
    pub id: String,
    /// Marker of the element the anchors refer to.
    pub target: String,
    /// Start boundary.
    pub start: Anchor,
    /// End boundary. Without one the zone is a single threshold at `start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Anchor>,
    /// Transition behavior.
    #[serde(default)]
    pub mode: ZoneMode,
}

impl ZoneSpec {
    /// Zone with no end boundary.
    pub fn new(
        id: impl Into<String>,
        target: impl Into<String>,
        start: Anchor,
        mode: ZoneMode,
    ) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            start,
            end: None,
            mode,
        }
    }

    /// Set the end boundary.
    pub fn until(mut self, end: Anchor) -> Self {
        self.end = Some(end);
        self
    }

    fn validate(&self) -> RidgelineResult<()> {
        if self.id.trim().is_empty() {
            return Err(RidgelineError::configuration("zone id must be non-empty"));
        }
        if self.target.trim().is_empty() {
            return Err(RidgelineError::configuration(format!(
                "zone '{}' has an empty target",
                self.id
            )));
        }
        Ok(())
    }
}

/// Handle to a registered zone. Disabled handles are returned when the target is absent; every
/// operation on them is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriggerHandle {
    id: u64,
    enabled: bool,
}

impl TriggerHandle {
    /// A handle that refers to nothing.
    pub const fn disabled() -> Self {
        Self {
            id: 0,
            enabled: false,
        }
    }

    /// Whether the zone was actually registered.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Transition kind reported to callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum TriggerKind {
    /// Zone entered.
    Enter,
    /// Zone left.
    Leave,
    /// Progress changed while inside a scrub zone.
    Update,
}

/// Which way the boundary was crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Crossing {
    /// Scrolling down the page.
    Forward,
    /// Scrolling back up.
    Backward,
}

/// A transition produced by [`TriggerScheduler::recompute`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TriggerEvent {
    /// Zone name.
    pub zone: String,
    /// Transition kind.
    pub kind: TriggerKind,
    /// Crossing direction.
    pub direction: Crossing,
    /// Zone progress at the time of the event.
    pub progress: f64,
    /// Scroll offset the event was computed from.
    pub scroll_y: f64,
    #[serde(skip)]
    pub(crate) handle: TriggerHandle,
}

impl TriggerEvent {
    /// Handle of the zone that produced the event.
    pub fn handle(&self) -> TriggerHandle {
        self.handle
    }
}

type EventFn = Box<dyn FnMut(&TriggerEvent)>;
type UpdateFn = Box<dyn FnMut(f64)>;

/// Optional per-zone callbacks, invoked synchronously from [`TriggerScheduler::recompute`].
#[derive(Default)]
pub struct TriggerCallbacks {
    on_enter: Option<EventFn>,
    on_leave: Option<EventFn>,
    on_update: Option<UpdateFn>,
}

impl std::fmt::Debug for TriggerCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerCallbacks")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_leave", &self.on_leave.is_some())
            .field("on_update", &self.on_update.is_some())
            .finish()
    }
}

impl TriggerCallbacks {
    /// No callbacks; events are still returned from `recompute`.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the enter callback.
    pub fn on_enter(mut self, f: impl FnMut(&TriggerEvent) + 'static) -> Self {
        self.on_enter = Some(Box::new(f));
        self
    }

    /// Set the leave callback.
    pub fn on_leave(mut self, f: impl FnMut(&TriggerEvent) + 'static) -> Self {
        self.on_leave = Some(Box::new(f));
        self
    }

    /// Set the progress callback (scrub zones only).
    pub fn on_update(mut self, f: impl FnMut(f64) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }
}

struct Zone {
    spec: ZoneSpec,
    callbacks: TriggerCallbacks,
    state: ZoneState,
    settle_to: ZoneState,
    progress: f64,
    start_y: f64,
    end_y: Option<f64>,
}

/// Zone progress for a scroll offset: `(scroll - start) / (end - start)` clamped to `[0, 1]`,
/// or a step at `start` when there is no end.
pub fn zone_progress(scroll_y: f64, start_y: f64, end_y: Option<f64>) -> f64 {
    match end_y {
        Some(end) => ((scroll_y - start_y) / (end - start_y)).clamp(0.0, 1.0),
        None => {
            if scroll_y > start_y {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Owns every registered zone and evaluates them against the viewport.
///
/// Zones are evaluated in registration order. Evaluation only happens when
/// [`TriggerScheduler::recompute`] is called, which the stage does on frames where the viewport
/// changed and after registration, so a zone crossed and re-crossed between two frames fires
/// nothing.
#[derive(Default)]
pub struct TriggerScheduler {
    zones: BTreeMap<u64, Zone>,
    next: u64,
    dirty: bool,
}

impl std::fmt::Debug for TriggerScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerScheduler")
            .field("zones", &self.zones.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn resolve(
    spec: &ZoneSpec,
    layout: &dyn LayoutSource,
    viewport: &Viewport,
) -> RidgelineResult<Option<(f64, Option<f64>)>> {
    let Some(rect) = layout.element_rect(&spec.target) else {
        return Ok(None);
    };
    let start_y = spec.start.resolve(&rect, viewport.height);
    let end_y = spec.end.map(|a| a.resolve(&rect, viewport.height));
    if let Some(end) = end_y {
        if end <= start_y {
            return Err(RidgelineError::transition_order(format!(
                "zone '{}' ends at {end} which is not after its start {start_y}",
                spec.id
            )));
        }
    }
    Ok(Some((start_y, end_y)))
}

impl TriggerScheduler {
    /// Empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone. A missing target yields a disabled handle; an end boundary that does
    /// not lie after the start is a transition-order error.
    #[tracing::instrument(level = "debug", skip_all, fields(zone = %spec.id))]
    pub fn register(
        &mut self,
        spec: ZoneSpec,
        callbacks: TriggerCallbacks,
        layout: &dyn LayoutSource,
        viewport: &Viewport,
    ) -> RidgelineResult<TriggerHandle> {
        spec.validate()?;
        let Some((start_y, end_y)) = resolve(&spec, layout, viewport)? else {
            tracing::debug!(marker = %spec.target, "trigger target missing; zone disabled");
            return Ok(TriggerHandle::disabled());
        };

        self.next += 1;
        let id = self.next;
        self.zones.insert(
            id,
            Zone {
                spec,
                callbacks,
                state: ZoneState::Idle,
                settle_to: ZoneState::Idle,
                progress: 0.0,
                start_y,
                end_y,
            },
        );
        self.dirty = true;
        Ok(TriggerHandle { id, enabled: true })
    }

    /// Remove a zone. Returns `false` if it was already gone or the handle is disabled.
    pub fn unregister(&mut self, handle: TriggerHandle) -> bool {
        handle.enabled && self.zones.remove(&handle.id).is_some()
    }

    /// Return a zone to `Idle` so one-shot zones can fire again.
    pub fn reset(&mut self, handle: TriggerHandle) -> bool {
        if !handle.enabled {
            return false;
        }
        let Some(zone) = self.zones.get_mut(&handle.id) else {
            return false;
        };
        zone.state = ZoneState::Idle;
        zone.settle_to = ZoneState::Idle;
        zone.progress = 0.0;
        self.dirty = true;
        true
    }

    /// Recompute boundaries after a layout or viewport-size change. Zone states are kept;
    /// zones whose target vanished or whose new geometry is invalid keep their old boundaries.
    pub fn relayout(&mut self, layout: &dyn LayoutSource, viewport: &Viewport) {
        for zone in self.zones.values_mut() {
            match resolve(&zone.spec, layout, viewport) {
                Ok(Some((start_y, end_y))) => {
                    zone.start_y = start_y;
                    zone.end_y = end_y;
                }
                Ok(None) => {
                    tracing::debug!(zone = %zone.spec.id, "target vanished; keeping geometry");
                }
                Err(err) => {
                    tracing::debug!(zone = %zone.spec.id, error = %err, "relayout rejected");
                }
            }
        }
        self.dirty = true;
    }

    /// Whether a registration, reset or relayout happened since the last recompute.
    pub fn needs_recompute(&self) -> bool {
        self.dirty
    }

    /// Evaluate every zone at the viewport's scroll offset, invoking callbacks and returning
    /// the produced events in order.
    pub fn recompute(&mut self, viewport: &Viewport) -> Vec<TriggerEvent> {
        self.dirty = false;
        let scroll_y = viewport.scroll_y;
        let mut events = Vec::new();
        for (&id, zone) in &mut self.zones {
            let handle = TriggerHandle { id, enabled: true };
            evaluate(zone, handle, scroll_y, &mut events);
        }
        events
    }

    /// Current state of a zone.
    pub fn state(&self, handle: TriggerHandle) -> Option<ZoneState> {
        self.zone(handle).map(|z| z.state)
    }

    /// Progress computed by the last recompute.
    pub fn progress(&self, handle: TriggerHandle) -> Option<f64> {
        self.zone(handle).map(|z| z.progress)
    }

    /// Resolved `(start_y, end_y)` boundaries.
    pub fn bounds(&self, handle: TriggerHandle) -> Option<(f64, Option<f64>)> {
        self.zone(handle).map(|z| (z.start_y, z.end_y))
    }

    /// The declarative zone a handle was registered with.
    pub fn spec(&self, handle: TriggerHandle) -> Option<&ZoneSpec> {
        self.zone(handle).map(|z| &z.spec)
    }

    /// Number of registered zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// `true` when no zones are registered.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    fn zone(&self, handle: TriggerHandle) -> Option<&Zone> {
        if !handle.enabled {
            return None;
        }
        self.zones.get(&handle.id)
    }
}

fn emit(
    zone: &mut Zone,
    handle: TriggerHandle,
    kind: TriggerKind,
    direction: Crossing,
    scroll_y: f64,
    out: &mut Vec<TriggerEvent>,
) {
    let event = TriggerEvent {
        zone: zone.spec.id.clone(),
        kind,
        direction,
        progress: zone.progress,
        scroll_y,
        handle,
    };
    match kind {
        TriggerKind::Enter => {
            if let Some(f) = zone.callbacks.on_enter.as_mut() {
                f(&event);
            }
        }
        TriggerKind::Leave => {
            if let Some(f) = zone.callbacks.on_leave.as_mut() {
                f(&event);
            }
        }
        TriggerKind::Update => {
            if let Some(f) = zone.callbacks.on_update.as_mut() {
                f(event.progress);
            }
        }
    }
    tracing::trace!(zone = %event.zone, kind = ?kind, progress = event.progress, "trigger");
    out.push(event);
}

fn enter(
    zone: &mut Zone,
    handle: TriggerHandle,
    dir: Crossing,
    y: f64,
    out: &mut Vec<TriggerEvent>,
) {
    emit(zone, handle, TriggerKind::Enter, dir, y, out);
    zone.state = ZoneState::Entering;
}

fn leave(
    zone: &mut Zone,
    handle: TriggerHandle,
    dir: Crossing,
    settle_to: ZoneState,
    y: f64,
    out: &mut Vec<TriggerEvent>,
) {
    emit(zone, handle, TriggerKind::Leave, dir, y, out);
    zone.state = ZoneState::Exiting;
    zone.settle_to = settle_to;
}

fn evaluate(zone: &mut Zone, handle: TriggerHandle, scroll_y: f64, out: &mut Vec<TriggerEvent>) {
    zone.state = match zone.state {
        ZoneState::Entering => ZoneState::Active,
        ZoneState::Exiting => zone.settle_to,
        s => s,
    };
    let prev = zone.progress;
    let p = zone_progress(scroll_y, zone.start_y, zone.end_y);
    zone.progress = p;
    let inside = |z: &Zone| matches!(z.state, ZoneState::Entering | ZoneState::Active);

    match zone.spec.mode {
        ZoneMode::OneShot => {
            if zone.state == ZoneState::Idle && p > 0.0 {
                enter(zone, handle, Crossing::Forward, scroll_y, out);
            }
            // A zone without an end only has a start threshold to cross.
            if inside(zone) && zone.end_y.is_some() && p >= 1.0 {
                leave(zone, handle, Crossing::Forward, ZoneState::Done, scroll_y, out);
            }
        }
        ZoneMode::Scrub => {
            match zone.state {
                ZoneState::Idle if p > 0.0 => {
                    enter(zone, handle, Crossing::Forward, scroll_y, out);
                }
                ZoneState::Done if p < 1.0 => {
                    enter(zone, handle, Crossing::Backward, scroll_y, out);
                }
                _ => {}
            }
            if inside(zone) {
                if p >= 1.0 {
                    leave(zone, handle, Crossing::Forward, ZoneState::Done, scroll_y, out);
                } else if p <= 0.0 {
                    leave(zone, handle, Crossing::Backward, ZoneState::Idle, scroll_y, out);
                } else {
                    let dir = if p < prev {
                        Crossing::Backward
                    } else {
                        Crossing::Forward
                    };
                    emit(zone, handle, TriggerKind::Update, dir, scroll_y, out);
                }
            }
        }
        ZoneMode::Toggle => {
            if zone.state == ZoneState::Idle && p > 0.0 {
                enter(zone, handle, Crossing::Forward, scroll_y, out);
            } else if inside(zone) && p <= 0.0 {
                leave(zone, handle, Crossing::Backward, ZoneState::Idle, scroll_y, out);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trigger/scheduler.rs"]
mod tests;
