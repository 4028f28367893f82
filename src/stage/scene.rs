//! JSON scene files: a page, stage settings, effects and a scripted scroll session.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::effects::config::EffectConfig;
use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::host::{PageDef, StaticPage};
use crate::stage::config::StageConfig;
use crate::stage::stage::Stage;
use crate::trigger::scheduler::TriggerEvent;
use crate::viewport::tracker::Viewport;

/// Time simulated after the last scripted step.
pub const SETTLE_SECONDS: f64 = 2.0;

/// An effect to create when the scene starts.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneEffect {
    /// Effect name or alias.
    pub name: String,
    /// Config passed to [`Stage::init_effect`].
    pub config: EffectConfig,
}

/// New viewport size.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneSize {
    /// Viewport width in px.
    pub width: f64,
    /// Viewport height in px.
    pub height: f64,
}

/// Input applied just before the first frame at or after `at`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneStep {
    /// Seconds from the start of the session.
    pub at: f64,
    /// New scroll offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<f64>,
    /// New viewport size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<SceneSize>,
    /// Pointer move to `[x, y]` in viewport pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<[f64; 2]>,
    /// Pointer leaves the document.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pointer_leave: bool,
    /// Section to tear down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown: Option<String>,
}

/// Serialized scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDef {
    /// Elements and their boxes.
    pub page: PageDef,
    /// Stage settings.
    #[serde(default)]
    pub stage: StageConfig,
    /// Viewport at the first frame.
    pub viewport: Viewport,
    /// Effects created before the first frame, in order.
    #[serde(default)]
    pub effects: Vec<SceneEffect>,
    /// Scripted input, ordered by `at`.
    #[serde(default)]
    pub steps: Vec<SceneStep>,
}

/// Outcome of one scene effect at init.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EffectStatus {
    /// Name as written in the scene.
    pub name: String,
    /// Owning section.
    pub section: String,
    /// Target marker.
    pub target: String,
    /// `false` when the effect degraded to a no-op.
    pub enabled: bool,
}

/// A trigger event stamped with the frame time it fired in.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TracedEvent {
    /// Frame time in seconds.
    pub time: f64,
    /// The transition.
    #[serde(flatten)]
    pub event: TriggerEvent,
}

/// What a scene run produced.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SceneTrace {
    /// Simulated frame rate.
    pub fps: f64,
    /// Frames run, including the one at time 0.
    pub frames: u64,
    /// Last simulated time in seconds.
    pub end_time: f64,
    /// Init outcome per scene effect.
    pub effects: Vec<EffectStatus>,
    /// Every trigger transition, in firing order.
    pub events: Vec<TracedEvent>,
    /// Effects stopped by frame errors.
    pub failures: usize,
    /// Last applied value per element and property.
    pub styles: BTreeMap<String, BTreeMap<String, f64>>,
}

/// A finished run: the stage in its final state plus the trace.
#[derive(Debug)]
pub struct SceneRun {
    /// The stage after the last frame.
    pub stage: Stage<StaticPage>,
    /// Everything the run recorded.
    pub trace: SceneTrace,
}

/// Scene boundary object; parse, validate, then [`Scene::run`].
#[derive(Clone, Debug)]
pub struct Scene {
    def: SceneDef,
}

impl Scene {
    /// Parse scene JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> RidgelineResult<Self> {
        let def: SceneDef = serde_json::from_reader(r)
            .map_err(|e| RidgelineError::serde(format!("parse scene JSON: {e}")))?;
        Ok(Self { def })
    }

    /// Read and parse a scene file.
    pub fn from_path(path: impl AsRef<Path>) -> RidgelineResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RidgelineError::configuration(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Wrap an already built definition.
    pub fn from_def(def: SceneDef) -> Self {
        Self { def }
    }

    /// The parsed definition.
    pub fn def(&self) -> &SceneDef {
        &self.def
    }

    /// Check everything that does not need a stage: viewport, stage config and step order.
    pub fn validate(&self) -> RidgelineResult<()> {
        let v = &self.def.viewport;
        Viewport::new(v.scroll_y, v.width, v.height)?;
        self.def.stage.validate()?;
        let mut last = 0.0;
        for (i, step) in self.def.steps.iter().enumerate() {
            if !step.at.is_finite() || step.at < last {
                return Err(RidgelineError::configuration(format!(
                    "steps[{i}].at must be finite and non-decreasing"
                )));
            }
            last = step.at;
        }
        Ok(())
    }

    /// Last scripted step plus [`SETTLE_SECONDS`].
    pub fn end_time(&self) -> f64 {
        self.def.steps.last().map_or(0.0, |s| s.at) + SETTLE_SECONDS
    }

    /// Build the page and stage and create every effect.
    pub fn build(&self) -> RidgelineResult<(Stage<StaticPage>, Vec<EffectStatus>)> {
        self.validate()?;
        let page = StaticPage::from_def(self.def.page.clone());
        let mut stage = Stage::new(page, self.def.stage.clone(), self.def.viewport)?;
        let mut effects = Vec::with_capacity(self.def.effects.len());
        for (i, effect) in self.def.effects.iter().enumerate() {
            let handle = stage
                .init_effect(&effect.name, effect.config.clone())
                .map_err(|e| match e {
                    RidgelineError::Configuration(msg) => RidgelineError::configuration(
                        format!("effects[{i}] ({}): {msg}", effect.name),
                    ),
                    other => other,
                })?;
            effects.push(EffectStatus {
                name: effect.name.clone(),
                section: effect.config.section.clone(),
                target: effect.config.target.clone(),
                enabled: handle.is_enabled(),
            });
        }
        Ok((stage, effects))
    }

    /// Simulate frames at `fps` from 0 to `until` (default [`Scene::end_time`]), applying steps
    /// as their time comes.
    pub fn run(&self, fps: f64, until: Option<f64>) -> RidgelineResult<SceneRun> {
        if !fps.is_finite() || fps <= 0.0 || fps > 1000.0 {
            return Err(RidgelineError::configuration("fps must be in (0, 1000]"));
        }
        let end_time = until.unwrap_or_else(|| self.end_time());
        if !end_time.is_finite() || end_time < 0.0 {
            return Err(RidgelineError::configuration("run time must be finite and >= 0"));
        }
        let (mut stage, effects) = self.build()?;

        let last = (end_time * fps + 1e-9).floor() as u64;
        let mut steps = self.def.steps.iter().peekable();
        let mut events = Vec::new();
        let mut failures = 0;
        for i in 0..=last {
            let time = i as f64 / fps;
            while let Some(step) = steps.next_if(|s| s.at <= time + 1e-9) {
                apply_step(&mut stage, step);
            }
            let report = stage.frame(time);
            failures += report.failures;
            events.extend(
                report
                    .events
                    .into_iter()
                    .map(|event| TracedEvent { time, event }),
            );
        }
        tracing::debug!(frames = last + 1, events = events.len(), failures, "scene finished");

        let styles = stage
            .host()
            .markers()
            .into_iter()
            .filter_map(|m| {
                let s = stage.host().styles(&m)?;
                (!s.is_empty()).then(|| (m, s.clone()))
            })
            .collect();
        Ok(SceneRun {
            stage,
            trace: SceneTrace {
                fps,
                frames: last + 1,
                end_time,
                effects,
                events,
                failures,
                styles,
            },
        })
    }
}

fn apply_step(stage: &mut Stage<StaticPage>, step: &SceneStep) {
    if let Some(y) = step.scroll {
        stage.push_scroll(y);
    }
    if let Some(size) = step.resize {
        stage.push_resize(size.width, size.height);
    }
    if let Some([x, y]) = step.pointer {
        stage.push_pointer(x, y);
    }
    if step.pointer_leave {
        stage.push_pointer_leave();
    }
    if let Some(section) = &step.teardown {
        stage.teardown_section(section);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stage/scene.rs"]
mod tests;
