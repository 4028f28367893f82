use crate::animation::timeline::MotionScale;
use crate::foundation::error::{RidgelineError, RidgelineResult};

/// What reduced motion does to timelines.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MotionPolicy {
    /// Multiplier applied to every duration, offset and delay, in `(0, 1]`.
    pub duration_scale: f64,
    /// Freeze infinite loops instead of shortening them.
    pub disable_infinite_loops: bool,
}

impl Default for MotionPolicy {
    fn default() -> Self {
        Self {
            duration_scale: 0.6,
            disable_infinite_loops: false,
        }
    }
}

/// Stage-wide settings, read once by [`crate::Stage::new`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Force reduced motion regardless of the host preference.
    pub reduced_motion: bool,
    /// Applied when reduced motion is in effect.
    pub motion: MotionPolicy,
    /// Base seed for particle randomness.
    pub seed: u64,
    /// Longest simulated step per frame, in seconds.
    pub max_frame_dt: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            motion: MotionPolicy::default(),
            seed: 0,
            max_frame_dt: 0.1,
        }
    }
}

impl StageConfig {
    /// Check the motion policy and frame clamp.
    pub fn validate(&self) -> RidgelineResult<()> {
        let s = self.motion.duration_scale;
        if !s.is_finite() || s <= 0.0 || s > 1.0 {
            return Err(RidgelineError::configuration(
                "motion.duration_scale must be in (0, 1]",
            ));
        }
        if !self.max_frame_dt.is_finite() || self.max_frame_dt <= 0.0 {
            return Err(RidgelineError::configuration(
                "max_frame_dt must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Timeline scaling for the given reduced-motion state.
    pub fn motion_scale(&self, reduced: bool) -> MotionScale {
        if reduced {
            MotionScale {
                duration_scale: self.motion.duration_scale,
                loops_allowed: !self.motion.disable_infinite_loops,
            }
        } else {
            MotionScale::default()
        }
    }
}
