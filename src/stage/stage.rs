//! The per-page orchestrator, driven once per host animation frame.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::animation::follow::Follower;
use crate::animation::timeline::{Composer, Target, Timeline};
use crate::effects::config::{EffectConfig, EffectKind};
use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::foundation::frame::{FrameHandle, FrameOwner, FrameScheduler};
use crate::foundation::core::Point;
use crate::foundation::ids::{EffectId, FollowerId, IdGen, RevealId, SystemId, TimelineId};
use crate::host::{Host, PropertyStore};
use crate::particles::engine::ParticleEngine;
use crate::render::reveal::Reveal;
use crate::stage::config::StageConfig;
use crate::stage::registry::{
    CanvasOwner, EffectHandle, EffectRecord, EffectRegistry, EffectResources,
};
use crate::trigger::scheduler::{
    TriggerCallbacks, TriggerEvent, TriggerHandle, TriggerKind, TriggerScheduler, ZoneSpec,
};
use crate::viewport::pointer::{PointerChange, PointerTracker};
use crate::viewport::tracker::{Subscription, Viewport, ViewportChange, ViewportTracker};

/// What a zone transition does to stage objects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Binding {
    /// Play once on enter.
    Play(TimelineId),
    /// Play on enter, reverse on leave.
    Toggle(TimelineId),
    /// Map zone progress onto timeline progress.
    Scrub(TimelineId),
    /// Spawn particles on enter.
    Burst { system: SystemId, count: usize },
}

/// Summary of one [`Stage::frame`] call.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct FrameReport {
    /// Host timestamp, seconds.
    pub time: f64,
    /// Simulated step, seconds.
    pub dt: f64,
    /// Flushed viewport change, if any.
    pub viewport: Option<ViewportChange>,
    /// Flushed pointer change, if any.
    pub pointer: Option<PointerChange>,
    /// Trigger transitions, in evaluation order.
    pub events: Vec<TriggerEvent>,
    /// Timelines sampled this frame.
    pub timelines_sampled: usize,
    /// Property writes flushed to the page and stage objects.
    pub writes: usize,
    /// Particle loop iterations run.
    pub particle_frames: usize,
    /// Reveal canvases redrawn.
    pub reveals_drawn: usize,
    /// Effects stopped by a frame error.
    pub failures: usize,
}

/// Owns every animation resource of one page.
///
/// Within a frame the phases run in a fixed order: viewport flush, trigger recompute, trigger
/// bindings, timeline interpolation, property flush, pointer followers, particle loops, reveal
/// redraws. A timeline started or a burst spawned by a trigger is therefore drawn in the same
/// frame its zone was entered.
pub struct Stage<H: Host> {
    pub(crate) host: H,
    pub(crate) config: StageConfig,
    reduced_motion: bool,
    pub(crate) tracker: ViewportTracker,
    pointer: PointerTracker,
    pub(crate) triggers: TriggerScheduler,
    pub(crate) composer: Composer,
    pub(crate) particles: ParticleEngine,
    pub(crate) reveals: BTreeMap<RevealId, Reveal>,
    pub(crate) reveal_ids: IdGen,
    pub(crate) followers: BTreeMap<FollowerId, Follower>,
    pub(crate) follower_ids: IdGen,
    pub(crate) frames: FrameScheduler,
    timeline_frames: BTreeMap<TimelineId, FrameHandle>,
    pub(crate) bindings: HashMap<TriggerHandle, Vec<Binding>>,
    pub(crate) registry: EffectRegistry,
    store: PropertyStore,
    last_time: Option<f64>,
}

impl<H: Host> std::fmt::Debug for Stage<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("reduced_motion", &self.reduced_motion)
            .field("viewport", &self.tracker.viewport())
            .field("effects", &self.registry.len())
            .field("zones", &self.triggers.len())
            .field("timelines", &self.composer.len())
            .field("particle_systems", &self.particles.len())
            .field("reveals", &self.reveals.len())
            .field("followers", &self.followers.len())
            .field("pending_frames", &self.frames.pending_len())
            .finish()
    }
}

impl<H: Host> Stage<H> {
    /// Build a stage. The reduced-motion preference is read here, once.
    pub fn new(host: H, config: StageConfig, viewport: Viewport) -> RidgelineResult<Self> {
        config.validate()?;
        let reduced_motion = config.reduced_motion || host.prefers_reduced_motion();
        let scale = config.motion_scale(reduced_motion);
        tracing::debug!(
            reduced_motion,
            duration_scale = scale.duration_scale,
            loops_allowed = scale.loops_allowed,
            "stage created"
        );
        Ok(Self {
            host,
            config,
            reduced_motion,
            tracker: ViewportTracker::new(viewport),
            pointer: PointerTracker::new(),
            triggers: TriggerScheduler::new(),
            composer: Composer::new(scale),
            particles: ParticleEngine::new(),
            reveals: BTreeMap::new(),
            reveal_ids: IdGen::default(),
            followers: BTreeMap::new(),
            follower_ids: IdGen::default(),
            frames: FrameScheduler::new(),
            timeline_frames: BTreeMap::new(),
            bindings: HashMap::new(),
            registry: EffectRegistry::new(),
            store: PropertyStore::new(),
            last_time: None,
        })
    }

    /// The page being animated.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access (layout changes, element removal). Call
    /// [`Stage::refresh_layout`] after moving elements.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Configuration the stage was built with.
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// `true` when the config or the host asked for reduced motion.
    pub fn is_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Viewport as of the last flushed frame.
    pub fn viewport(&self) -> Viewport {
        self.tracker.viewport()
    }

    /// Every timeline on the stage.
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Every registered scroll zone.
    pub fn triggers(&self) -> &TriggerScheduler {
        &self.triggers
    }

    /// Every particle system on the stage.
    pub fn particles(&self) -> &ParticleEngine {
        &self.particles
    }

    /// A canvas reveal created by an effect.
    pub fn reveal(&self, id: RevealId) -> Option<&Reveal> {
        self.reveals.get(&id)
    }

    /// A pointer follower created by an effect.
    pub fn follower(&self, id: FollowerId) -> Option<&Follower> {
        self.followers.get(&id)
    }

    /// Pointer position as of the last flushed frame, in viewport pixels.
    pub fn pointer(&self) -> Option<Point> {
        self.pointer.position()
    }

    /// Live effects and section bookkeeping.
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Pending frame requests.
    pub fn frames(&self) -> &FrameScheduler {
        &self.frames
    }

    /// Record a raw scroll event; applied on the next frame.
    pub fn push_scroll(&mut self, scroll_y: f64) {
        self.tracker.push_scroll(scroll_y);
    }

    /// Record a raw resize event; applied on the next frame.
    pub fn push_resize(&mut self, width: f64, height: f64) {
        self.tracker.push_resize(width, height);
    }

    /// Record a raw pointer move in viewport pixels; applied on the next frame.
    pub fn push_pointer(&mut self, x: f64, y: f64) {
        self.pointer.push_move(x, y);
    }

    /// Record the pointer leaving the document; applied on the next frame.
    pub fn push_pointer_leave(&mut self) {
        self.pointer.push_leave();
    }

    /// Subscribe page glue to coalesced scroll/resize notifications, tracked under `section`.
    pub fn on_scroll_or_resize(
        &mut self,
        section: &str,
        listener: impl FnMut(&Viewport, ViewportChange) + 'static,
    ) -> Subscription {
        let sub = self.tracker.on_scroll_or_resize(listener);
        self.registry.track_subscription(section, sub);
        sub
    }

    /// Register a raw zone with callbacks, tracked under `section`.
    pub fn register_zone(
        &mut self,
        section: &str,
        spec: ZoneSpec,
        callbacks: TriggerCallbacks,
    ) -> RidgelineResult<TriggerHandle> {
        let viewport = self.tracker.viewport();
        let handle = self
            .triggers
            .register(spec, callbacks, &self.host, &viewport)?;
        if handle.is_enabled() {
            self.registry.track_zone(section, handle);
        }
        Ok(handle)
    }

    /// Remove a raw zone. Idempotent.
    pub fn unregister_zone(&mut self, handle: TriggerHandle) -> bool {
        self.bindings.remove(&handle);
        self.triggers.unregister(handle)
    }

    /// Re-arm a one-shot zone.
    pub fn reset_zone(&mut self, handle: TriggerHandle) -> bool {
        self.triggers.reset(handle)
    }

    /// Start or resume a timeline.
    pub fn play(&mut self, id: TimelineId) -> bool {
        let found = self.composer.play(id);
        self.sync_timeline_frame(id);
        found
    }

    /// Pause a timeline and cancel its pending frame.
    pub fn pause(&mut self, id: TimelineId) -> bool {
        let found = self.composer.pause(id);
        self.sync_timeline_frame(id);
        found
    }

    /// Reverse a timeline from its current position.
    pub fn reverse(&mut self, id: TimelineId) -> bool {
        let found = self.composer.reverse(id);
        self.sync_timeline_frame(id);
        found
    }

    /// Move a timeline's cursor; values are applied on the next frame.
    pub fn seek(&mut self, id: TimelineId, time: f64) -> bool {
        self.composer.seek(id, time)
    }

    /// Recompute zone geometry and canvas sizes after a layout change. Animation state is kept.
    pub fn refresh_layout(&mut self) {
        let viewport = self.tracker.viewport();
        self.triggers.relayout(&self.host, &viewport);
        for canvas in self.registry.canvases() {
            let Some(rect) = self.host.element_rect(&canvas.container) else {
                tracing::debug!(container = %canvas.container, "canvas container gone; size kept");
                continue;
            };
            let (w, h) = rect.surface_size();
            let resized = match canvas.owner {
                CanvasOwner::Particles(id) => self.particles.get_mut(id).map(|s| s.resize(w, h)),
                CanvasOwner::Reveal(id) => self.reveals.get_mut(&id).map(|r| r.resize(w, h)),
            };
            if let Some(Err(err)) = resized {
                tracing::debug!(
                    container = %canvas.container,
                    error = %err,
                    "canvas resize failed"
                );
            }
        }
    }

    /// Create an effect by name. Configuration errors are returned; a missing target or an
    /// unavailable canvas yields a disabled handle instead.
    #[tracing::instrument(
        level = "debug",
        skip(self, config),
        fields(section = %config.section, marker = %config.target)
    )]
    pub fn init_effect(
        &mut self,
        name: &str,
        config: EffectConfig,
    ) -> RidgelineResult<EffectHandle> {
        let kind = EffectKind::from_name(name)?;
        let resolved = config.resolve(kind)?;
        let id = self.registry.allocate();
        if kind == EffectKind::PointerFollow && self.reduced_motion {
            tracing::debug!(%kind, "effect disabled under reduced motion");
            return Ok(EffectHandle::disabled(id));
        }
        let mut resources = EffectResources::default();

        match self.build_effect(&config, &resolved, &mut resources) {
            Ok(()) => {
                tracing::debug!(effect = id.0, %kind, "effect ready");
                self.registry.insert(EffectRecord {
                    id,
                    kind,
                    config,
                    resources,
                });
                Ok(EffectHandle::enabled(id))
            }
            Err(err) => {
                self.release(resources);
                if !err.is_degradable() {
                    return Err(err);
                }
                if matches!(err, RidgelineError::ResourceExhaustion(_)) {
                    tracing::warn!(%kind, error = %err, "effect disabled");
                } else {
                    tracing::debug!(%kind, error = %err, "effect disabled");
                }
                Ok(EffectHandle::disabled(id))
            }
        }
    }

    /// Tear one effect down. Returns `false` when disabled or already torn down.
    pub fn teardown_effect(&mut self, handle: EffectHandle) -> bool {
        if !handle.is_enabled() {
            return false;
        }
        match self.registry.remove(handle.id()) {
            Some(record) => {
                self.release(record.resources);
                true
            }
            None => false,
        }
    }

    /// Release everything a section created. Repeated calls are no-ops returning `false`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn teardown_section(&mut self, section: &str) -> bool {
        let Some(tracked) = self.registry.take_section(section) else {
            tracing::debug!("section already torn down");
            return false;
        };
        for id in tracked.effects {
            if let Some(record) = self.registry.remove(id) {
                self.release(record.resources);
            }
        }
        for zone in tracked.zones {
            self.unregister_zone(zone);
        }
        for sub in tracked.subscriptions {
            self.tracker.unsubscribe(sub);
        }
        true
    }

    pub(crate) fn release(&mut self, resources: EffectResources) {
        // Loops stop before their canvases leave the page.
        for id in &resources.systems {
            self.particles.destroy(*id, &mut self.frames);
        }
        for id in &resources.timelines {
            if let Some(handle) = self.timeline_frames.remove(id) {
                self.frames.cancel(handle);
            }
            self.composer.kill(*id);
        }
        for id in &resources.followers {
            if let Some(mut follower) = self.followers.remove(id) {
                follower.cancel(&mut self.frames);
            }
        }
        for zone in &resources.zones {
            self.bindings.remove(zone);
            self.triggers.unregister(*zone);
        }
        for id in &resources.reveals {
            if let Some(mut reveal) = self.reveals.remove(id) {
                reveal.clear();
            }
        }
        for node in &resources.nodes {
            self.host.remove_node(*node);
        }
    }

    pub(crate) fn sync_timeline_frame(&mut self, id: TimelineId) {
        if self.composer.is_running(id) {
            if !self.timeline_frames.contains_key(&id) {
                let handle = self.frames.request(FrameOwner::Timeline(id));
                self.timeline_frames.insert(id, handle);
            }
        } else if let Some(handle) = self.timeline_frames.remove(&id) {
            self.frames.cancel(handle);
        }
    }

    /// Run one frame at host timestamp `now` (seconds).
    pub fn frame(&mut self, now: f64) -> FrameReport {
        let dt = match self.last_time {
            Some(prev) if now.is_finite() => (now - prev).clamp(0.0, self.config.max_frame_dt),
            _ => 0.0,
        };
        if now.is_finite() {
            self.last_time = Some(now);
        }
        let mut report = FrameReport {
            time: now,
            dt,
            ..FrameReport::default()
        };

        let mut due_timelines = BTreeSet::new();
        let mut due_systems = Vec::new();
        let mut due_followers = BTreeSet::new();
        for owner in self.frames.take_due() {
            match owner {
                FrameOwner::Timeline(id) => {
                    self.timeline_frames.remove(&id);
                    due_timelines.insert(id);
                }
                FrameOwner::Particles(id) => due_systems.push(id),
                FrameOwner::Follower(id) => {
                    if let Some(follower) = self.followers.get_mut(&id) {
                        follower.frame_fired();
                    }
                    due_followers.insert(id);
                }
            }
        }

        report.viewport = self.tracker.flush();
        report.pointer = self.pointer.flush();
        if report.viewport.is_some_and(|c| c.resized) {
            self.refresh_layout();
        }

        if report.viewport.is_some() || self.triggers.needs_recompute() {
            let viewport = self.tracker.viewport();
            report.events = self.triggers.recompute(&viewport);
        }
        let mut bursts = Vec::new();
        for event in &report.events {
            self.dispatch(event, &mut bursts);
        }

        report.timelines_sampled = self.run_timelines(dt, &due_timelines);
        report.writes = self.flush_writes(&mut report.failures);
        let retarget = report.pointer.is_some() || report.viewport.is_some();
        report.writes += self.run_followers(dt, &due_followers, retarget, &mut report.failures);

        // Systems started by this frame's triggers draw now, without integrating.
        let mut runs: Vec<(SystemId, f64)> = due_systems.iter().map(|id| (*id, dt)).collect();
        for id in bursts {
            if !runs.iter().any(|(r, _)| *r == id) {
                runs.push((id, 0.0));
            }
        }
        for (id, step) in runs {
            let Some(system) = self.particles.get_mut(id) else {
                continue;
            };
            match system.run_frame(step, &mut self.frames) {
                Ok(()) => report.particle_frames += 1,
                Err(err) => {
                    let owner = self.registry.owner_of_system(id);
                    self.report_failure(owner, "particle loop", &err);
                    report.failures += 1;
                }
            }
        }

        let mut broken = Vec::new();
        for (id, reveal) in &mut self.reveals {
            if !reveal.is_dirty() {
                continue;
            }
            match reveal.render() {
                Ok(()) => report.reveals_drawn += 1,
                Err(err) => broken.push((*id, err)),
            }
        }
        for (id, err) in broken {
            self.reveals.remove(&id);
            let owner = self.registry.owner_of_reveal(id);
            self.report_failure(owner, "reveal", &err);
            report.failures += 1;
        }

        report
    }

    fn dispatch(&mut self, event: &TriggerEvent, bursts: &mut Vec<SystemId>) {
        let Some(bindings) = self.bindings.get(&event.handle()).cloned() else {
            return;
        };
        for binding in bindings {
            match (binding, event.kind) {
                (Binding::Play(id), TriggerKind::Enter) => {
                    if !self.composer.is_running(id) {
                        self.play(id);
                    }
                }
                (Binding::Toggle(id), TriggerKind::Enter) => {
                    self.play(id);
                }
                (Binding::Toggle(id), TriggerKind::Leave) => {
                    self.reverse(id);
                }
                (Binding::Scrub(id), _) => {
                    self.composer.seek_progress(id, event.progress);
                }
                (Binding::Burst { system, count }, TriggerKind::Enter) => {
                    let spawned = self.particles.burst(system, count, &mut self.frames);
                    tracing::debug!(system = system.0, spawned, "particle burst");
                    bursts.push(system);
                }
                _ => {}
            }
        }
    }

    fn run_timelines(&mut self, dt: f64, due: &BTreeSet<TimelineId>) -> usize {
        let mut sampled = 0;
        for id in self.composer.ids() {
            let running = self.composer.is_running(id);
            let dirty = self.composer.get(id).is_some_and(Timeline::needs_apply);
            if !(running || dirty) {
                continue;
            }
            if running {
                let step = if due.contains(&id) { dt } else { 0.0 };
                self.composer.advance(id, step);
            }
            if self.composer.get(id).is_some_and(Timeline::needs_apply) {
                self.composer.sample_into(id, &mut self.store);
                sampled += 1;
            }
            self.sync_timeline_frame(id);
        }
        sampled
    }

    fn run_followers(
        &mut self,
        dt: f64,
        due: &BTreeSet<FollowerId>,
        retarget: bool,
        failures: &mut usize,
    ) -> usize {
        let pointer = self.pointer.position();
        let viewport = self.tracker.viewport();
        let mut writes = 0;
        let mut broken = Vec::new();
        for (id, follower) in &mut self.followers {
            if retarget {
                let goal = follower.goal_for(pointer, &viewport, &self.host);
                follower.retarget(goal);
            }
            if due.contains(id) {
                follower.advance(dt);
            }
            if let Some(v) = follower.take_write() {
                let marker = follower.target();
                let result = self
                    .host
                    .apply(marker, "translateX", v.x)
                    .and_then(|()| self.host.apply(marker, "translateY", v.y));
                match result {
                    Ok(()) => writes += 2,
                    Err(err) => {
                        broken.push((*id, err));
                        continue;
                    }
                }
            }
            follower.ensure_scheduled(&mut self.frames);
        }
        for (id, err) in broken {
            if let Some(mut follower) = self.followers.remove(&id) {
                follower.cancel(&mut self.frames);
            }
            let owner = self.registry.owner_of_follower(id);
            self.report_failure(owner, "pointer follower", &err);
            *failures += 1;
        }
        writes
    }

    fn flush_writes(&mut self, failures: &mut usize) -> usize {
        let writes = self.store.drain();
        let mut applied = 0;
        for w in &writes {
            if self.composer.get(w.source).is_none() {
                continue;
            }
            let result = match &w.target {
                Target::Element(marker) => self.host.apply(marker, &w.property, w.value),
                Target::Particles(id) => match self.particles.get_mut(*id) {
                    Some(system) => system.set_param(&w.property, w.value),
                    None => Err(RidgelineError::frame(format!(
                        "particle system {} is gone",
                        id.0
                    ))),
                },
                Target::Reveal(id) => match self.reveals.get_mut(id) {
                    Some(reveal) => {
                        reveal.set_progress(w.value);
                        Ok(())
                    }
                    None => Err(RidgelineError::frame(format!("reveal {} is gone", id.0))),
                },
            };
            match result {
                Ok(()) => applied += 1,
                Err(err) => {
                    if let Some(handle) = self.timeline_frames.remove(&w.source) {
                        self.frames.cancel(handle);
                    }
                    self.composer.kill(w.source);
                    let owner = self.registry.owner_of_timeline(w.source);
                    self.report_failure(owner, "timeline", &err);
                    *failures += 1;
                }
            }
        }
        applied
    }

    fn report_failure(&mut self, owner: Option<EffectId>, what: &str, err: &RidgelineError) {
        let first = owner.is_none_or(|id| self.registry.first_failure(id));
        if first {
            tracing::warn!(
                effect = owner.map(|id| id.0),
                error = %err,
                "{what} stopped after a frame error"
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stage/stage.rs"]
mod tests;
