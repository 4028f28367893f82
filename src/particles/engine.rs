//! Registry of particle systems keyed by id.

use std::collections::BTreeMap;

use crate::foundation::error::RidgelineResult;
use crate::foundation::frame::FrameScheduler;
use crate::foundation::ids::{IdGen, SystemId};
use crate::particles::system::{ParticleConfig, ParticleSystem};
use crate::render::surface::Surface;

/// Owns every particle system on the stage.
#[derive(Debug, Default)]
pub struct ParticleEngine {
    systems: BTreeMap<SystemId, ParticleSystem>,
    ids: IdGen,
}

impl ParticleEngine {
    /// Engine with no systems.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config` and create an idle system drawing into `surface`.
    pub fn create(
        &mut self,
        config: ParticleConfig,
        surface: Box<dyn Surface>,
    ) -> RidgelineResult<SystemId> {
        config.validate()?;
        let id = SystemId(self.ids.next());
        self.systems
            .insert(id, ParticleSystem::new(id, config, surface));
        Ok(id)
    }

    /// A live system.
    pub fn get(&self, id: SystemId) -> Option<&ParticleSystem> {
        self.systems.get(&id)
    }

    /// A live system, mutably.
    pub fn get_mut(&mut self, id: SystemId) -> Option<&mut ParticleSystem> {
        self.systems.get_mut(&id)
    }

    /// Spawn a burst and make sure the loop is scheduled. Returns the number spawned.
    pub fn burst(&mut self, id: SystemId, count: usize, frames: &mut FrameScheduler) -> usize {
        let Some(system) = self.systems.get_mut(&id) else {
            return 0;
        };
        let n = system.spawn(count);
        system.start();
        system.ensure_scheduled(frames);
        n
    }

    /// Spawn particles and draw them once without starting the loop, for fields that must stay
    /// still. Returns the number spawned.
    pub fn populate(&mut self, id: SystemId, count: usize) -> RidgelineResult<usize> {
        let Some(system) = self.systems.get_mut(&id) else {
            return Ok(0);
        };
        let n = system.spawn(count);
        system.render()?;
        Ok(n)
    }

    /// Stop and drop a system. Returns `false` when it was already gone.
    pub fn destroy(&mut self, id: SystemId, frames: &mut FrameScheduler) -> bool {
        match self.systems.remove(&id) {
            Some(mut system) => {
                system.shutdown(frames);
                true
            }
            None => false,
        }
    }

    /// Ids of all live systems.
    pub fn ids(&self) -> Vec<SystemId> {
        self.systems.keys().copied().collect()
    }

    /// Number of live systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// `true` when no system is live.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/particles/engine.rs"]
mod tests;
