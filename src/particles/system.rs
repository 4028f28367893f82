//! Canvas particles: spawn, integrate, cull, draw.
//!
//! Bursts decay and cull themselves; ambient fields spawn with zero decay and bounce inside the
//! canvas until the owning system stops running.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::foundation::core::{Point, Rgba8, Span, Vec2};
use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::foundation::frame::{FrameHandle, FrameOwner, FrameScheduler};
use crate::foundation::ids::SystemId;
use crate::render::surface::Surface;

/// Upper bound accepted for `max_count`.
pub const MAX_PARTICLES: usize = 2000;

/// One simulated point.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Position in surface pixels.
    pub pos: Point,
    /// Velocity in px/s.
    pub vel: Vec2,
    /// Radius in px.
    pub size: f64,
    /// Index into the system palette.
    pub color: usize,
    /// Remaining life; drawn as alpha, removed at or below 0.
    pub life: f64,
    /// Life lost per second.
    pub decay: f64,
}

/// Ranges new particles are sampled from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpawnPolicy {
    /// Per-axis velocity in px/s.
    pub velocity: Span,
    /// Radius in px.
    pub size: Span,
    /// Life lost per second.
    pub decay: Span,
    /// Starting life.
    pub life: f64,
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self {
            velocity: Span::new(-180.0, 180.0),
            size: Span::new(1.0, 5.0),
            decay: Span::new(0.6, 1.8),
            life: 1.0,
        }
    }
}

impl SpawnPolicy {
    /// Check every range is finite and ordered, with non-negative size and decay.
    pub fn validate(&self) -> RidgelineResult<()> {
        self.velocity.validate("spawn.velocity")?;
        self.size.validate("spawn.size")?;
        self.decay.validate("spawn.decay")?;
        if self.size.min < 0.0 {
            return Err(RidgelineError::configuration("spawn.size must be >= 0"));
        }
        if self.decay.min < 0.0 {
            return Err(RidgelineError::configuration("spawn.decay must be >= 0"));
        }
        if !self.life.is_finite() || self.life <= 0.0 {
            return Err(RidgelineError::configuration("spawn.life must be > 0"));
        }
        Ok(())
    }
}

/// What happens to a particle that reaches the canvas edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Particles fly off the canvas.
    #[default]
    Open,
    /// Velocity flips on the axis that left the canvas.
    Bounce,
}

/// Construction parameters for a [`ParticleSystem`].
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleConfig {
    /// Cap on live particles; spawning stops there.
    pub max_count: usize,
    /// Ranges new particles are drawn from.
    pub spawn: SpawnPolicy,
    /// Colors picked uniformly per particle.
    pub palette: Vec<Rgba8>,
    /// Downward acceleration in px/s².
    pub gravity: f64,
    /// Horizontal acceleration in px/s².
    pub wind: f64,
    /// Global alpha multiplier.
    pub opacity: f64,
    /// Canvas edge behavior.
    pub edges: EdgeMode,
    /// RNG seed; equal seeds spawn identical particles.
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_count: 80,
            spawn: SpawnPolicy::default(),
            palette: vec![Rgba8::rgb(0xA5, 0x74, 0x4E), Rgba8::rgb(0xF2, 0xD2, 0x75)],
            gravity: 540.0,
            wind: 0.0,
            opacity: 1.0,
            edges: EdgeMode::Open,
            seed: 0,
        }
    }
}

impl ParticleConfig {
    /// Check the count, palette, forces and opacity, then the spawn ranges.
    pub fn validate(&self) -> RidgelineResult<()> {
        if self.max_count == 0 || self.max_count > MAX_PARTICLES {
            return Err(RidgelineError::configuration(format!(
                "max_count must be in 1..={MAX_PARTICLES}"
            )));
        }
        if self.palette.is_empty() {
            return Err(RidgelineError::configuration("palette must be non-empty"));
        }
        if !(self.gravity.is_finite() && self.wind.is_finite()) {
            return Err(RidgelineError::configuration("gravity/wind must be finite"));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(RidgelineError::configuration("opacity must be in [0, 1]"));
        }
        self.spawn.validate()
    }
}

/// A set of particles drawing into one exclusively owned surface.
///
/// The frame loop reschedules itself only while particles remain and the system is running;
/// clearing `running` is enough to make the next frame the last.
pub struct ParticleSystem {
    id: SystemId,
    particles: Vec<Particle>,
    config: ParticleConfig,
    running: bool,
    frame: Option<FrameHandle>,
    surface: Box<dyn Surface>,
    rng: StdRng,
}

impl std::fmt::Debug for ParticleSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleSystem")
            .field("id", &self.id)
            .field("particles", &self.particles.len())
            .field("running", &self.running)
            .field("frame", &self.frame)
            .finish()
    }
}

impl ParticleSystem {
    /// Build an idle system. The configuration must already be validated.
    pub fn new(id: SystemId, config: ParticleConfig, surface: Box<dyn Surface>) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            id,
            particles: Vec::with_capacity(config.max_count),
            config,
            running: false,
            frame: None,
            surface,
            rng,
        }
    }

    /// Engine-assigned id.
    pub fn id(&self) -> SystemId {
        self.id
    }

    /// Live particles, in spawn order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Live particle count.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// `true` when no particle is alive.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// `true` while the loop may reschedule itself.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Configured particle cap.
    pub fn max_count(&self) -> usize {
        self.config.max_count
    }

    /// Pending frame request, if the loop is scheduled.
    pub fn frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    /// Append up to `count` particles, never exceeding `max_count`. Returns how many spawned.
    pub fn spawn(&mut self, count: usize) -> usize {
        let room = self.config.max_count.saturating_sub(self.particles.len());
        let n = count.min(room);
        let (w, h) = self.surface.size();
        let (w, h) = (f64::from(w), f64::from(h));
        let spawn = &self.config.spawn;
        for _ in 0..n {
            let p = Particle {
                pos: Point::new(self.rng.gen_range(0.0..=w), self.rng.gen_range(0.0..=h)),
                vel: Vec2::new(
                    self.rng.gen_range(spawn.velocity.min..=spawn.velocity.max),
                    self.rng.gen_range(spawn.velocity.min..=spawn.velocity.max),
                ),
                size: self.rng.gen_range(spawn.size.min..=spawn.size.max),
                color: self.rng.gen_range(0..self.config.palette.len()),
                life: spawn.life,
                decay: self.rng.gen_range(spawn.decay.min..=spawn.decay.max),
            };
            self.particles.push(p);
        }
        n
    }

    /// Integrate by `dt` seconds and drop every particle whose life ran out.
    pub fn step(&mut self, dt: f64) {
        if !dt.is_finite() || dt < 0.0 {
            return;
        }
        let accel = Vec2::new(self.config.wind, self.config.gravity);
        let (w, h) = self.surface.size();
        let (w, h) = (f64::from(w), f64::from(h));
        let bounce = self.config.edges == EdgeMode::Bounce;
        for p in &mut self.particles {
            p.vel += accel * dt;
            p.pos += p.vel * dt;
            p.life -= p.decay * dt;
            if bounce {
                if p.pos.x < 0.0 || p.pos.x > w {
                    p.vel.x = -p.vel.x;
                    p.pos.x = p.pos.x.clamp(0.0, w);
                }
                if p.pos.y < 0.0 || p.pos.y > h {
                    p.vel.y = -p.vel.y;
                    p.pos.y = p.pos.y.clamp(0.0, h);
                }
            }
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Clear the surface and draw every live particle with alpha = life.
    pub fn render(&mut self) -> RidgelineResult<()> {
        self.surface.clear();
        for p in &self.particles {
            let circle = kurbo::Circle::new(p.pos, p.size);
            let path = kurbo::Shape::to_path(&circle, 0.1);
            let color = self.config.palette[p.color % self.config.palette.len()];
            self.surface
                .fill_path(&path, color, p.life.clamp(0.0, 1.0) * self.config.opacity);
        }
        self.surface.present()
    }

    /// Mark the system running (burst start).
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Clear `running`; the pending frame, if any, is the loop's last.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Request the next frame when the loop should be alive and is not already scheduled.
    pub fn ensure_scheduled(&mut self, frames: &mut FrameScheduler) {
        if self.running && !self.particles.is_empty() && self.frame.is_none() {
            self.frame = Some(frames.request(FrameOwner::Particles(self.id)));
        }
    }

    /// One loop iteration: step, render, then reschedule while particles remain and the system
    /// is running. A render failure stops the loop and is returned to the caller.
    pub fn run_frame(&mut self, dt: f64, frames: &mut FrameScheduler) -> RidgelineResult<()> {
        self.frame = None;
        self.step(dt);
        if let Err(err) = self.render() {
            self.running = false;
            return Err(err);
        }
        self.ensure_scheduled(frames);
        if self.particles.is_empty() {
            self.running = false;
        }
        Ok(())
    }

    /// Stop the loop, cancel any pending frame and wipe the canvas.
    pub fn shutdown(&mut self, frames: &mut FrameScheduler) {
        self.running = false;
        if let Some(handle) = self.frame.take() {
            frames.cancel(handle);
        }
        self.particles.clear();
        self.surface.clear();
        if let Err(err) = self.surface.present() {
            tracing::debug!(system = self.id.0, error = %err, "particle canvas already detached");
        }
    }

    /// Resize the owned canvas to its container.
    pub fn resize(&mut self, width: u32, height: u32) -> RidgelineResult<()> {
        self.surface.resize(width, height)
    }

    /// Set a timeline-drivable parameter (`gravity`, `wind`, `opacity`).
    pub fn set_param(&mut self, name: &str, value: f64) -> RidgelineResult<()> {
        if !value.is_finite() {
            return Err(RidgelineError::frame(format!("particle param '{name}' is not finite")));
        }
        match name {
            "gravity" => self.config.gravity = value,
            "wind" => self.config.wind = value,
            "opacity" => self.config.opacity = value.clamp(0.0, 1.0),
            other => {
                return Err(RidgelineError::frame(format!(
                    "unknown particle param '{other}'"
                )));
            }
        }
        Ok(())
    }

    /// Current value of a timeline-drivable parameter.
    pub fn param(&self, name: &str) -> Option<f64> {
        match name {
            "gravity" => Some(self.config.gravity),
            "wind" => Some(self.config.wind),
            "opacity" => Some(self.config.opacity),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/particles/system.rs"]
mod tests;
