//! Bookkeeping of every resource an effect or section created, for total teardown.

use std::collections::{BTreeMap, BTreeSet};

use crate::effects::config::{EffectConfig, EffectKind};
use crate::foundation::ids::{
    EffectId, FollowerId, IdGen, NodeId, RevealId, SystemId, TimelineId,
};
use crate::host::Host;
use crate::stage::stage::Stage;
use crate::trigger::scheduler::TriggerHandle;
use crate::viewport::tracker::Subscription;

/// Which stage object draws into an injected canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasOwner {
    /// A particle system's canvas.
    Particles(SystemId),
    /// A reveal cover.
    Reveal(RevealId),
}

/// An injected canvas and the element whose box it follows.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasBinding {
    /// The injected canvas node.
    pub node: NodeId,
    /// Marker of the element whose box the canvas covers.
    pub container: String,
    /// What draws into it.
    pub owner: CanvasOwner,
}

/// Handles created by one effect instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectResources {
    /// Scroll zones driving the effect.
    pub zones: Vec<TriggerHandle>,
    /// Timelines it animates with.
    pub timelines: Vec<TimelineId>,
    /// Particle systems it owns.
    pub systems: Vec<SystemId>,
    /// Canvas reveals it owns.
    pub reveals: Vec<RevealId>,
    /// Pointer followers it owns.
    pub followers: Vec<FollowerId>,
    /// Injected nodes (canvases and decorative spans), removed last.
    pub nodes: Vec<NodeId>,
    /// Canvases kept sized to their containers.
    pub canvases: Vec<CanvasBinding>,
}

/// A live effect instance.
#[derive(Clone, Debug)]
pub struct EffectRecord {
    /// Registry id.
    pub id: EffectId,
    /// Effect class.
    pub kind: EffectKind,
    /// Config the effect was created from.
    pub config: EffectConfig,
    /// Everything to release at teardown.
    pub resources: EffectResources,
}

/// Resources registered directly against a section by page glue.
#[derive(Debug, Default)]
pub struct SectionResources {
    /// Effects initialized for the section.
    pub effects: Vec<EffectId>,
    /// Zones registered by page glue.
    pub zones: Vec<TriggerHandle>,
    /// Viewport subscriptions registered by page glue.
    pub subscriptions: Vec<Subscription>,
}

/// Typed handle returned by [`Stage::init_effect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectHandle {
    id: EffectId,
    enabled: bool,
}

impl EffectHandle {
    pub(crate) fn enabled(id: EffectId) -> Self {
        Self { id, enabled: true }
    }

    pub(crate) fn disabled(id: EffectId) -> Self {
        Self { id, enabled: false }
    }

    /// Registry id, also for disabled handles.
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// `false` when the effect degraded to a no-op at init.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Tear this effect down. Returns `false` if it was disabled or already torn down.
    pub fn teardown<H: Host>(&self, stage: &mut Stage<H>) -> bool {
        stage.teardown_effect(*self)
    }
}

/// Registry of effects grouped by section.
#[derive(Debug, Default)]
pub struct EffectRegistry {
    effects: BTreeMap<EffectId, EffectRecord>,
    sections: BTreeMap<String, SectionResources>,
    ids: IdGen,
    warned: BTreeSet<EffectId>,
}

impl EffectRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn allocate(&mut self) -> EffectId {
        EffectId(self.ids.next())
    }

    pub(crate) fn insert(&mut self, record: EffectRecord) {
        self.sections
            .entry(record.config.section.clone())
            .or_default()
            .effects
            .push(record.id);
        self.effects.insert(record.id, record);
    }

    pub(crate) fn remove(&mut self, id: EffectId) -> Option<EffectRecord> {
        let record = self.effects.remove(&id)?;
        if let Some(section) = self.sections.get_mut(&record.config.section) {
            section.effects.retain(|e| *e != id);
        }
        self.warned.remove(&id);
        Some(record)
    }

    pub(crate) fn track_zone(&mut self, section: &str, zone: TriggerHandle) {
        self.sections
            .entry(section.to_owned())
            .or_default()
            .zones
            .push(zone);
    }

    pub(crate) fn track_subscription(&mut self, section: &str, sub: Subscription) {
        self.sections
            .entry(section.to_owned())
            .or_default()
            .subscriptions
            .push(sub);
    }

    pub(crate) fn take_section(&mut self, section: &str) -> Option<SectionResources> {
        self.sections.remove(section)
    }

    /// Record that a failure of `id` was logged. Returns `true` the first time only.
    pub(crate) fn first_failure(&mut self, id: EffectId) -> bool {
        self.warned.insert(id)
    }

    /// A live effect.
    pub fn get(&self, id: EffectId) -> Option<&EffectRecord> {
        self.effects.get(&id)
    }

    /// Live effects in id order.
    pub fn records(&self) -> impl Iterator<Item = &EffectRecord> {
        self.effects.values()
    }

    /// Effects of a section, in init order.
    pub fn effects_in(&self, section: &str) -> Vec<EffectId> {
        self.sections
            .get(section)
            .map(|s| s.effects.clone())
            .unwrap_or_default()
    }

    /// Sections with at least one tracked resource.
    pub fn sections(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    /// Effect owning a timeline, if it is still live.
    pub fn owner_of_timeline(&self, id: TimelineId) -> Option<EffectId> {
        self.records()
            .find(|r| r.resources.timelines.contains(&id))
            .map(|r| r.id)
    }

    /// Effect owning a system, if it is still live.
    pub fn owner_of_system(&self, id: SystemId) -> Option<EffectId> {
        self.records()
            .find(|r| r.resources.systems.contains(&id))
            .map(|r| r.id)
    }

    /// Effect owning a reveal, if it is still live.
    pub fn owner_of_reveal(&self, id: RevealId) -> Option<EffectId> {
        self.records()
            .find(|r| r.resources.reveals.contains(&id))
            .map(|r| r.id)
    }

    /// Effect owning a follower, if it is still live.
    pub fn owner_of_follower(&self, id: FollowerId) -> Option<EffectId> {
        self.records()
            .find(|r| r.resources.followers.contains(&id))
            .map(|r| r.id)
    }

    /// Every injected canvas across live effects.
    pub fn canvases(&self) -> Vec<CanvasBinding> {
        self.records()
            .flat_map(|r| r.resources.canvases.iter().cloned())
            .collect()
    }

    /// Number of live effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// `true` when no effect is live.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
