//! Per-axis baseline latches turning absolute samples into per-tick deltas.

use glam::Vec3;

/// One latched baseline for a scalar axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisTracker {
    baseline: Option<f32>,
}

impl AxisTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the latch. Inactive clears; the first active sample only latches.
    pub fn step(&mut self, current: f32, active: bool) -> f32 {
        if !active {
            self.baseline = None;
            return 0.0;
        }
        let delta = match self.baseline {
            Some(prev) => current - prev,
            None => 0.0,
        };
        self.baseline = Some(current);
        delta
    }

    pub fn clear(&mut self) {
        self.baseline = None;
    }

    pub fn baseline(&self) -> Option<f32> {
        self.baseline
    }

    pub fn is_latched(&self) -> bool {
        self.baseline.is_some()
    }
}

/// Vertical (palm y) and yaw (palm x) axes of a rotate gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotateAxes {
    pub vertical: AxisTracker,
    pub yaw: AxisTracker,
}

/// Depth (palm z) axis of a zoom or scale gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthAxis {
    pub depth: AxisTracker,
}

/// All three axes of a pan gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PanAxes {
    pub x: AxisTracker,
    pub y: AxisTracker,
    pub z: AxisTracker,
}

/// Common surface over the per-action tracker groups.
pub trait AxisGroup {
    fn clear(&mut self);
    fn is_latched(&self) -> bool;
}

impl AxisGroup for RotateAxes {
    fn clear(&mut self) {
        self.vertical.clear();
        self.yaw.clear();
    }

    fn is_latched(&self) -> bool {
        self.vertical.is_latched() || self.yaw.is_latched()
    }
}

impl AxisGroup for DepthAxis {
    fn clear(&mut self) {
        self.depth.clear();
    }

    fn is_latched(&self) -> bool {
        self.depth.is_latched()
    }
}

impl AxisGroup for PanAxes {
    fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.z.clear();
    }

    fn is_latched(&self) -> bool {
        self.x.is_latched() || self.y.is_latched() || self.z.is_latched()
    }
}

impl PanAxes {
    pub fn step(&mut self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.x.step(p.x, true),
            self.y.step(p.y, true),
            self.z.step(p.z, true),
        )
    }
}
