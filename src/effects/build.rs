//! Turns validated effect configs into zones, timelines, particle systems and reveals.

use kurbo::ParamCurveArclen;

use crate::animation::ease::Ease;
use crate::animation::follow::{Chase, Follower, Response};
use crate::animation::timeline::{Mutation, RepeatMode, Segment, Target, TimelineConfig};
use crate::effects::config::{EffectConfig, EffectKind, Params, ResolvedEffect};
use crate::foundation::core::{BezPath, Rgba8, Span, stable_seed};
use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::foundation::ids::{FollowerId, NodeId, RevealId, TimelineId};
use crate::host::Host;
use crate::particles::system::{EdgeMode, ParticleConfig, SpawnPolicy};
use crate::render::reveal::{Reveal, RevealKind, parse_reveal};
use crate::render::surface::Surface;
use crate::stage::registry::{CanvasBinding, CanvasOwner, EffectResources};
use crate::stage::stage::{Binding, Stage};
use crate::trigger::anchor::{Anchor, Edge};
use crate::trigger::scheduler::{TriggerCallbacks, ZoneMode, ZoneSpec};

/// Default burst size.
pub const DEFAULT_PARTICLE_COUNT: usize = 80;

/// Default size of an ambient field.
pub const DEFAULT_FIELD_COUNT: usize = 40;

/// Fraction of the gap a cursor ring closes per 60 Hz frame.
pub const DEFAULT_POINTER_LERP: f64 = 0.15;

const EARTH: Rgba8 = Rgba8::rgb(0xA5, 0x74, 0x4E);
const SUN: Rgba8 = Rgba8::rgb(0xF2, 0xD2, 0x75);

/// Total arc length of an SVG path.
pub fn path_length(path: &BezPath) -> f64 {
    path.segments().map(|seg| seg.arclen(1e-3)).sum()
}

fn positive(what: &str, v: f64) -> RidgelineResult<f64> {
    if v > 0.0 {
        Ok(v)
    } else {
        Err(RidgelineError::configuration(format!("{what} must be > 0")))
    }
}

fn zone_or(
    r: &ResolvedEffect,
    target: &str,
    start: Anchor,
    end: Option<Anchor>,
    mode: ZoneMode,
) -> ZoneSpec {
    r.zone.clone().unwrap_or_else(|| ZoneSpec {
        id: format!("{}:{target}", r.kind),
        target: target.to_owned(),
        start,
        end,
        mode,
    })
}

impl<H: Host> Stage<H> {
    pub(crate) fn build_effect(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        let params = Params::new(&config.params);
        match r.kind {
            EffectKind::ParticleBurst => self.build_particle_burst(config, r, &params, res),
            EffectKind::CanvasReveal => self.build_canvas_reveal(config, r, &params, res),
            EffectKind::PathDraw => self.build_path_draw(config, r, &params, res),
            EffectKind::Parallax => self.build_parallax(config, r, &params, res),
            EffectKind::Breathing => self.build_breathing(config, r, &params, res),
            EffectKind::StaggerReveal => self.build_stagger_reveal(config, r, &params, res),
            EffectKind::AmbientField => self.build_ambient_field(config, r, &params, res),
            EffectKind::PointerFollow => self.build_pointer_follow(config, r, &params, res),
            EffectKind::PointerDrift => self.build_pointer_drift(config, r, &params, res),
        }
    }

    fn require_target(&self, kind: EffectKind, marker: &str) -> RidgelineResult<()> {
        match self.host.element_rect(marker) {
            Some(_) => Ok(()),
            None => Err(RidgelineError::missing_target(format!(
                "{kind} target '{marker}'"
            ))),
        }
    }

    fn new_timeline(
        &mut self,
        label: String,
        repeat: RepeatMode,
        res: &mut EffectResources,
    ) -> RidgelineResult<TimelineId> {
        let id = self
            .composer
            .create_timeline(TimelineConfig::new(repeat).labeled(label))?;
        res.timelines.push(id);
        Ok(id)
    }

    fn bind(
        &mut self,
        zone: ZoneSpec,
        binding: Binding,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        let viewport = self.tracker.viewport();
        let handle = self
            .triggers
            .register(zone, TriggerCallbacks::none(), &self.host, &viewport)?;
        if handle.is_enabled() {
            res.zones.push(handle);
            self.bindings.entry(handle).or_default().push(binding);
        }
        Ok(())
    }

    /// Bind `timeline` to `zone` according to its mode, or play it right away.
    fn start_or_bind(
        &mut self,
        zone: Option<ZoneSpec>,
        timeline: TimelineId,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        match zone {
            None => {
                self.play(timeline);
                Ok(())
            }
            Some(zone) => {
                let binding = match zone.mode {
                    ZoneMode::OneShot => Binding::Play(timeline),
                    ZoneMode::Toggle => Binding::Toggle(timeline),
                    ZoneMode::Scrub => Binding::Scrub(timeline),
                };
                self.bind(zone, binding, res)
            }
        }
    }

    fn inject_canvas(
        &mut self,
        container: &str,
        res: &mut EffectResources,
    ) -> RidgelineResult<(NodeId, Box<dyn Surface>)> {
        let (node, surface) = self.host.attach_canvas(container)?;
        res.nodes.push(node);
        Ok((node, surface))
    }

    fn build_particle_burst(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        params: &Params<'_>,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        let count = r.particle_count.unwrap_or(DEFAULT_PARTICLE_COUNT);
        let speed = params.f64_or("speed", 180.0)?;
        let m = r.duration_multiplier;
        let particle_config = ParticleConfig {
            max_count: count,
            spawn: SpawnPolicy {
                velocity: Span::new(-speed.abs(), speed.abs()),
                size: Span::new(params.f64_or("size_min", 1.0)?, params.f64_or("size_max", 5.0)?),
                decay: Span::new(
                    params.f64_or("decay_min", 0.6)? / m,
                    params.f64_or("decay_max", 1.8)? / m,
                ),
                life: 1.0,
            },
            palette: if r.palette.is_empty() {
                vec![EARTH, SUN]
            } else {
                r.palette.clone()
            },
            gravity: params.f64_or("gravity", 540.0)?,
            wind: params.f64_or("wind", 0.0)?,
            opacity: params.f64_or("opacity", 1.0)?,
            edges: EdgeMode::Open,
            seed: stable_seed(self.config.seed, &format!("{}:{}", config.section, config.target)),
        };
        particle_config.validate()?;
        let zone = zone_or(
            r,
            &config.target,
            Anchor::new(Edge::Top, Edge::Percent(50.0)),
            None,
            ZoneMode::OneShot,
        );

        self.require_target(r.kind, &config.target)?;
        let (node, surface) = self.inject_canvas(&config.target, res)?;
        let system = self.particles.create(particle_config, surface)?;
        res.systems.push(system);
        res.canvases.push(CanvasBinding {
            node,
            container: config.target.clone(),
            owner: CanvasOwner::Particles(system),
        });
        self.bind(zone, Binding::Burst { system, count }, res)
    }

    fn build_ambient_field(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        params: &Params<'_>,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        let count = r.particle_count.unwrap_or(DEFAULT_FIELD_COUNT);
        let speed = params.f64_or("speed", 12.0)?.abs() / r.duration_multiplier;
        let particle_config = ParticleConfig {
            max_count: count,
            spawn: SpawnPolicy {
                velocity: Span::new(-speed, speed),
                size: Span::new(params.f64_or("size_min", 1.0)?, params.f64_or("size_max", 3.0)?),
                decay: Span::fixed(0.0),
                life: 1.0,
            },
            palette: if r.palette.is_empty() {
                vec![EARTH]
            } else {
                r.palette.clone()
            },
            gravity: 0.0,
            wind: 0.0,
            opacity: params.f64_or("opacity", 0.35)?,
            edges: EdgeMode::Bounce,
            seed: stable_seed(self.config.seed, &format!("{}:{}", config.section, config.target)),
        };
        particle_config.validate()?;

        self.require_target(r.kind, &config.target)?;
        let (node, surface) = self.inject_canvas(&config.target, res)?;
        let system = self.particles.create(particle_config, surface)?;
        res.systems.push(system);
        res.canvases.push(CanvasBinding {
            node,
            container: config.target.clone(),
            owner: CanvasOwner::Particles(system),
        });

        if !self.composer.scale().loops_allowed {
            let drawn = self.particles.populate(system, count)?;
            tracing::debug!(system = system.0, drawn, "ambient field held still");
            return Ok(());
        }
        match r.zone.clone() {
            None => {
                self.particles.burst(system, count, &mut self.frames);
                Ok(())
            }
            Some(zone) => self.bind(zone, Binding::Burst { system, count }, res),
        }
    }

    fn new_follower(
        &mut self,
        target: &str,
        response: Response,
        chase: Chase,
        res: &mut EffectResources,
    ) -> FollowerId {
        let id = FollowerId(self.follower_ids.next());
        let mut follower = Follower::new(id, target, response, chase);
        let viewport = self.tracker.viewport();
        let goal = follower.goal_for(self.pointer(), &viewport, &self.host);
        follower.retarget(goal);
        follower.ensure_scheduled(&mut self.frames);
        self.followers.insert(id, follower);
        res.followers.push(id);
        id
    }

    fn build_pointer_follow(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        params: &Params<'_>,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        if r.zone.is_some() {
            return Err(RidgelineError::configuration(format!(
                "{} follows the pointer and takes no trigger",
                r.kind
            )));
        }
        let factor = params.f64_or("lerp", DEFAULT_POINTER_LERP)?;
        if factor <= 0.0 || factor > 1.0 {
            return Err(RidgelineError::configuration("params.lerp must be in (0, 1]"));
        }

        self.require_target(r.kind, &config.target)?;
        self.new_follower(&config.target, Response::Track, Chase::Lerp { factor }, res);
        Ok(())
    }

    fn build_pointer_drift(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        params: &Params<'_>,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        if r.zone.is_some() {
            return Err(RidgelineError::configuration(format!(
                "{} follows the pointer and takes no trigger",
                r.kind
            )));
        }
        let layers: Vec<String> = match params.array("targets")? {
            Some(list) => list
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_owned).ok_or_else(|| {
                        RidgelineError::configuration("params.targets must hold strings")
                    })
                })
                .collect::<RidgelineResult<_>>()?,
            None => vec![config.target.clone()],
        };
        let intensity = positive("params.intensity", params.f64_or("intensity", 10.0)?)?;
        let duration = positive("params.duration", params.f64_or("duration", 3.0)?)?
            * r.duration_multiplier
            * self.composer.scale().duration_scale;
        let ease = r.ease.unwrap_or(Ease::OutCubic);

        self.require_target(r.kind, &config.target)?;
        for (i, layer) in layers.iter().enumerate() {
            if self.host.element_rect(layer).is_none() {
                tracing::debug!(marker = %layer, "drift layer missing; skipped");
                continue;
            }
            let response = Response::Drift {
                region: config.target.clone(),
                intensity: intensity * (i + 1) as f64,
            };
            self.new_follower(layer, response, Chase::Tween { duration, ease }, res);
        }
        Ok(())
    }

    fn build_canvas_reveal(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        params: &Params<'_>,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        let kind = parse_reveal(params.str_or("kind", "circle")?, &config.params)?;
        let color = r.palette.first().copied().unwrap_or(EARTH);
        let duration = positive("params.duration", params.f64_or("duration", 2.0)?)?
            * r.duration_multiplier;
        let zone = match (&r.zone, kind) {
            (Some(zone), _) => Some(zone.clone()),
            (None, RevealKind::Circle) => Some(zone_or(
                r,
                &config.target,
                Anchor::new(Edge::Top, Edge::Center),
                Some(Anchor::new(Edge::Center, Edge::Center)),
                ZoneMode::Scrub,
            )),
            (None, _) => None,
        };
        let scrubbed = zone.as_ref().is_some_and(|z| z.mode == ZoneMode::Scrub);
        let ease = r
            .ease
            .unwrap_or(if scrubbed { Ease::Linear } else { Ease::InOutCubic });

        self.require_target(r.kind, &config.target)?;
        let (node, surface) = self.inject_canvas(&config.target, res)?;
        let reveal = RevealId(self.reveal_ids.next());
        self.reveals.insert(reveal, Reveal::new(kind, color, surface));
        res.reveals.push(reveal);
        res.canvases.push(CanvasBinding {
            node,
            container: config.target.clone(),
            owner: CanvasOwner::Reveal(reveal),
        });

        let timeline = self.new_timeline(
            format!("{}:{}", r.kind, config.target),
            r.repeat.unwrap_or_default(),
            res,
        )?;
        self.composer.add_segment(
            timeline,
            Segment::new("cover", 0.0, duration, ease).with(Mutation::new(
                Target::Reveal(reveal),
                "progress",
                0.0,
                1.0,
            )),
        )?;
        self.start_or_bind(zone, timeline, res)
    }

    fn build_path_draw(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        params: &Params<'_>,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        let mut sources: Vec<(String, String)> = Vec::new();
        match params.array("paths")? {
            Some(list) => {
                for (i, item) in list.iter().enumerate() {
                    let target = item.get("target").and_then(|v| v.as_str());
                    let d = item.get("d").and_then(|v| v.as_str());
                    match (target, d) {
                        (Some(t), Some(d)) => sources.push((t.to_owned(), d.to_owned())),
                        _ => {
                            return Err(RidgelineError::configuration(format!(
                                "params.paths[{i}] needs string 'target' and 'd'"
                            )));
                        }
                    }
                }
            }
            None => {
                let d = params.opt_str("d")?.ok_or_else(|| {
                    RidgelineError::configuration("path-draw needs params.d or params.paths")
                })?;
                sources.push((config.target.clone(), d.to_owned()));
            }
        }
        if sources.is_empty() {
            return Err(RidgelineError::configuration("params.paths is empty"));
        }

        let mut lengths = Vec::with_capacity(sources.len());
        for (target, d) in &sources {
            let path = BezPath::from_svg(d).map_err(|e| {
                RidgelineError::configuration(format!("path data for '{target}': {e}"))
            })?;
            let len = path_length(&path);
            if len.is_nan() || len <= 0.0 {
                return Err(RidgelineError::configuration(format!(
                    "path for '{target}' has zero length"
                )));
            }
            lengths.push(len);
        }

        let m = r.duration_multiplier;
        let delay = params.f64_or("delay", 0.3)?;
        let stagger = params.f64_or("stagger", 0.4)?;
        let duration = positive("params.duration", params.f64_or("duration", 3.0)?)?;
        let step = params.f64_or("duration_step", 0.6)?;
        let ease = r.ease.unwrap_or(Ease::InOutCubic);
        let zone = zone_or(
            r,
            &config.target,
            Anchor::new(Edge::Top, Edge::Percent(80.0)),
            None,
            ZoneMode::OneShot,
        );

        self.require_target(r.kind, &config.target)?;
        let timeline = self.new_timeline(
            format!("{}:{}", r.kind, config.target),
            r.repeat.unwrap_or_default(),
            res,
        )?;
        for (i, ((target, _), len)) in sources.iter().zip(lengths).enumerate() {
            if self.host.element_rect(target).is_none() {
                tracing::debug!(marker = %target, "path element missing; skipped");
                continue;
            }
            let at = i as f64;
            let el = Target::element(target.clone());
            self.composer.add_segment(
                timeline,
                Segment::new(
                    format!("stroke-{i}"),
                    (delay + at * stagger) * m,
                    positive("path duration", duration + at * step)? * m,
                    ease,
                )
                .with(Mutation::new(el.clone(), "stroke-dasharray", len, len))
                .with(Mutation::new(el, "stroke-dashoffset", len, 0.0)),
            )?;
        }
        self.start_or_bind(Some(zone), timeline, res)
    }

    fn build_parallax(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        params: &Params<'_>,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        let property = params.str_or("property", "translateY")?;
        let from = params.f64_or("from", 0.0)?;
        let to = params.f64_or("to", -100.0)?;
        let duration = positive("params.duration", params.f64_or("duration", 1.0)?)?
            * r.duration_multiplier;
        let zone = zone_or(
            r,
            &config.target,
            Anchor::new(Edge::Top, Edge::Bottom),
            Some(Anchor::new(Edge::Bottom, Edge::Top)),
            ZoneMode::Scrub,
        );

        self.require_target(r.kind, &config.target)?;
        let timeline = self.new_timeline(
            format!("{}:{}", r.kind, config.target),
            r.repeat.unwrap_or_default(),
            res,
        )?;
        self.composer.add_segment(
            timeline,
            Segment::new("shift", 0.0, duration, r.ease.unwrap_or(Ease::Linear)).with(
                Mutation::new(Target::element(config.target.clone()), property, from, to),
            ),
        )?;
        self.start_or_bind(Some(zone), timeline, res)
    }

    fn build_breathing(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        params: &Params<'_>,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        let property = params.str_or("property", "scale")?;
        let from = params.f64_or("from", 1.0)?;
        let to = params.f64_or("to", 1.05)?;
        let duration = positive("params.duration", params.f64_or("duration", 15.0)?)?
            * r.duration_multiplier;

        self.require_target(r.kind, &config.target)?;
        let timeline = self.new_timeline(
            format!("{}:{}", r.kind, config.target),
            r.repeat.unwrap_or(RepeatMode::Yoyo),
            res,
        )?;
        self.composer.add_segment(
            timeline,
            Segment::new("breath", 0.0, duration, r.ease.unwrap_or(Ease::InOutSine)).with(
                Mutation::new(Target::element(config.target.clone()), property, from, to),
            ),
        )?;
        self.start_or_bind(r.zone.clone(), timeline, res)
    }

    fn build_stagger_reveal(
        &mut self,
        config: &EffectConfig,
        r: &ResolvedEffect,
        params: &Params<'_>,
        res: &mut EffectResources,
    ) -> RidgelineResult<()> {
        let explicit: Option<Vec<String>> = match params.array("targets")? {
            Some(list) => Some(
                list.iter()
                    .map(|v| {
                        v.as_str().map(str::to_owned).ok_or_else(|| {
                            RidgelineError::configuration("params.targets must hold strings")
                        })
                    })
                    .collect::<RidgelineResult<_>>()?,
            ),
            None => None,
        };
        let split = params.bool_or("split", true)?;
        let distance = params.f64_or("distance", 30.0)?;
        let stagger = params.f64_or("stagger", 0.08)?;
        let duration = positive("params.duration", params.f64_or("duration", 0.8)?)?;
        let m = r.duration_multiplier;
        let ease = r.ease.unwrap_or(Ease::OutCubic);
        let zone = zone_or(
            r,
            &config.target,
            Anchor::new(Edge::Top, Edge::Percent(80.0)),
            None,
            ZoneMode::OneShot,
        );

        self.require_target(r.kind, &config.target)?;
        let items = match explicit {
            Some(items) => items,
            None if split => {
                let words = self.host.split_words(&config.target)?;
                res.nodes.extend(words.iter().map(|(node, _)| *node));
                let markers: Vec<String> = words.into_iter().map(|(_, m)| m).collect();
                if markers.is_empty() {
                    vec![config.target.clone()]
                } else {
                    markers
                }
            }
            None => vec![config.target.clone()],
        };

        let timeline = self.new_timeline(
            format!("{}:{}", r.kind, config.target),
            r.repeat.unwrap_or_default(),
            res,
        )?;
        for (i, marker) in items.into_iter().enumerate() {
            let el = Target::element(marker);
            self.composer.add_segment(
                timeline,
                Segment::new(format!("item-{i}"), i as f64 * stagger * m, duration * m, ease)
                    .with(Mutation::new(el.clone(), "opacity", 0.0, 1.0))
                    .with(Mutation::new(el, "translateY", distance, 0.0)),
            )?;
        }
        self.start_or_bind(Some(zone), timeline, res)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/build.rs"]
mod tests;
