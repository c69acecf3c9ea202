use std::f32::consts::PI;

use crate::config::{Action, ControlsConfig};

/// Empirical span of useful hand travel, in tracker units.
pub const INPUT_RANGE: (f32, f32) = (-400.0, 400.0);

/// Half-width of the scale increment range.
pub const SCALE_RANGE: f32 = 2.0;

/// Affine map of `x` from `[a1, a2]` onto `[b1, b2]`.
pub fn map_linear(x: f32, a1: f32, a2: f32, b1: f32, b2: f32) -> f32 {
    b1 + (x - a1) * (b2 - b1) / (a2 - a1)
}

/// What kind of quantity an increment feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Angle,
    Distance,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMapper {
    step: f32,
}

impl TransformMapper {
    pub fn new(step: f32) -> Self {
        Self { step }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    fn half_range(&self, output: Output) -> f32 {
        match output {
            Output::Angle => PI,
            Output::Distance => self.step,
            Output::Scale => SCALE_RANGE,
        }
    }

    /// Speed times, for fingertip-driven actions, the finger factor.
    pub fn gain(cfg: &ControlsConfig, action: Action) -> f32 {
        let g = cfg.gesture(action);
        match cfg.finger_factor {
            Some(f) if !g.use_hand_position => g.speed * f,
            _ => g.speed,
        }
    }

    pub fn map(&self, cfg: &ControlsConfig, action: Action, output: Output, raw: f32) -> f32 {
        let r = self.half_range(output);
        Self::gain(cfg, action) * map_linear(raw, INPUT_RANGE.0, INPUT_RANGE.1, -r, r)
    }
}

/// Scene distance unit: the camera's initial depth, or `near * far / 10`
/// (that is `10^(log10 near + log10 far) / 10`) when the camera starts at z = 0.
pub fn derive_step(camera_z: f32, near: f32, far: f32) -> f32 {
    if camera_z == 0.0 {
        near * far / 10.0
    } else {
        camera_z
    }
}
