//! Rotate, zoom/scale and pan controllers.

use glam::{Quat, Vec3};
use log::{debug, trace};

use crate::config::{Action, ControlsConfig, GestureConfig};
use crate::frame::Frame;
use crate::gestures::control_point;
use crate::mapping::{Output, TransformMapper};
use crate::target::{Pose, TargetAdapter, look_rotation};
use crate::tracker::{AxisGroup, DepthAxis, PanAxes, RotateAxes};

/// What a controller did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Gesture not shown (or no usable hand); latches cleared.
    Inactive,
    /// Gesture shown and the increment was applied.
    Applied,
    /// Gesture shown but the bounded quantity would have left its range.
    /// Latches still advanced. For rotate, yaw is applied regardless.
    Dropped,
}

impl Tick {
    pub fn is_active(self) -> bool {
        self != Tick::Inactive
    }
}

pub trait ActionController {
    fn action(&self) -> Action;

    fn update(
        &mut self,
        frame: &Frame,
        cfg: &ControlsConfig,
        mapper: &TransformMapper,
        target: &mut dyn TargetAdapter,
    ) -> Tick;

    /// Forget all baselines so the next active tick latches afresh.
    fn reset(&mut self);

    fn is_tracking(&self) -> bool;
}

fn release<G: AxisGroup>(action: Action, axes: &mut G) -> Tick {
    if axes.is_latched() {
        debug!("{action} released");
    }
    axes.clear();
    Tick::Inactive
}

fn engage<G: AxisGroup>(action: Action, axes: &G) {
    if !axes.is_latched() {
        debug!("{action} engaged");
    }
}

#[derive(Debug, Clone, Default)]
pub struct RotateController {
    pub axes: RotateAxes,
}

impl RotateController {
    /// Orbit around `center`: tilt toward/away from world up, then yaw about it.
    fn orbit(pose: &mut Pose, center: Vec3, vertical: f32, yaw: f32, g: &GestureConfig) -> Tick {
        let mut t = pose.position - center;
        let candidate = t.angle_between(Vec3::Y) + vertical;
        let tick = if g.within_bounds(candidate) {
            let n = Vec3::new(t.z, 0.0, -t.x).normalize_or_zero();
            if n != Vec3::ZERO {
                t = Quat::from_axis_angle(n, vertical) * t;
            }
            Tick::Applied
        } else {
            debug!("rotate: polar angle {candidate:.4} out of bounds, tilt dropped");
            Tick::Dropped
        };

        t = Quat::from_rotation_y(-yaw) * t;
        pose.position = center + t;
        if let Some(r) = look_rotation(pose.position, center) {
            pose.rotation = r;
        }
        tick
    }

    /// Turn the entity in place about world up. Vertical motion is latched
    /// but never tilts the entity.
    fn in_place(pose: &mut Pose, yaw: f32) -> Tick {
        pose.rotation = (Quat::from_rotation_y(yaw) * pose.rotation).normalize();
        Tick::Applied
    }
}

impl ActionController for RotateController {
    fn action(&self) -> Action {
        Action::Rotate
    }

    fn update(
        &mut self,
        frame: &Frame,
        cfg: &ControlsConfig,
        mapper: &TransformMapper,
        target: &mut dyn TargetAdapter,
    ) -> Tick {
        let g = &cfg.rotate;
        let Some(p) = control_point(frame, g) else {
            return release(Action::Rotate, &mut self.axes);
        };
        engage(Action::Rotate, &self.axes);

        let dy = self.axes.vertical.step(p.y, true);
        let dx = self.axes.yaw.step(p.x, true);
        let vertical = mapper.map(cfg, Action::Rotate, Output::Angle, dy);
        let yaw = mapper.map(cfg, Action::Rotate, Output::Angle, dx);
        trace!("rotate: raw ({dx:.2}, {dy:.2}) -> yaw {yaw:.5} tilt {vertical:.5}");

        let mut pose = target.pose();
        let tick = match target.orbit_target() {
            Some(center) => Self::orbit(&mut pose, center, vertical, yaw, g),
            None => Self::in_place(&mut pose, yaw),
        };
        target.set_pose(pose);
        tick
    }

    fn reset(&mut self) {
        self.axes.clear();
    }

    fn is_tracking(&self) -> bool {
        self.axes.is_latched()
    }
}

/// Camera distance for orbit targets, uniform scale for in-place targets.
#[derive(Debug, Clone, Default)]
pub struct ZoomController {
    pub axis: DepthAxis,
}

impl ActionController for ZoomController {
    fn action(&self) -> Action {
        Action::Zoom
    }

    fn update(
        &mut self,
        frame: &Frame,
        cfg: &ControlsConfig,
        mapper: &TransformMapper,
        target: &mut dyn TargetAdapter,
    ) -> Tick {
        let g = &cfg.zoom;
        let Some(p) = control_point(frame, g) else {
            return release(Action::Zoom, &mut self.axis);
        };
        engage(Action::Zoom, &self.axis);

        let dz = self.axis.depth.step(p.z, true);
        let mut pose = target.pose();
        let tick = match target.orbit_target() {
            Some(center) => {
                let d = mapper.map(cfg, Action::Zoom, Output::Distance, dz);
                let t = pose.position - center;
                let candidate = t.length() - d;
                trace!("zoom: raw {dz:.2} -> {d:.4}, distance {candidate:.4}");
                if g.within_bounds(candidate) {
                    pose.position -= t.normalize_or_zero() * d;
                    Tick::Applied
                } else {
                    debug!("zoom: distance {candidate:.4} out of bounds, dropped");
                    Tick::Dropped
                }
            }
            None => {
                let d = mapper.map(cfg, Action::Zoom, Output::Scale, dz);
                let candidate = pose.scale.x + d;
                trace!("scale: raw {dz:.2} -> {d:.4}, scale {candidate:.4}");
                if g.within_bounds(candidate) {
                    pose.scale = Vec3::splat(candidate);
                    Tick::Applied
                } else {
                    debug!("scale: {candidate:.4} out of bounds, dropped");
                    Tick::Dropped
                }
            }
        };
        target.set_pose(pose);
        tick
    }

    fn reset(&mut self) {
        self.axis.clear();
    }

    fn is_tracking(&self) -> bool {
        self.axis.is_latched()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PanController {
    pub axes: PanAxes,
}

impl ActionController for PanController {
    fn action(&self) -> Action {
        Action::Pan
    }

    fn update(
        &mut self,
        frame: &Frame,
        cfg: &ControlsConfig,
        mapper: &TransformMapper,
        target: &mut dyn TargetAdapter,
    ) -> Tick {
        let Some(p) = control_point(frame, &cfg.pan) else {
            return release(Action::Pan, &mut self.axes);
        };
        engage(Action::Pan, &self.axes);

        let raw = self.axes.step(p);
        let local = Vec3::new(
            mapper.map(cfg, Action::Pan, Output::Distance, raw.x),
            mapper.map(cfg, Action::Pan, Output::Distance, raw.y),
            mapper.map(cfg, Action::Pan, Output::Distance, raw.z),
        );
        let world = target.viewer().rotation * local;
        trace!("pan: raw {raw} -> world {world}");

        let mut pose = target.pose();
        match target.orbit_target() {
            // move the whole reference frame so camera-to-target geometry is kept
            Some(center) => {
                pose.position -= world;
                target.set_orbit_target(center - world);
            }
            None => pose.position += world,
        }
        target.set_pose(pose);
        Tick::Applied
    }

    fn reset(&mut self) {
        self.axes.clear();
    }

    fn is_tracking(&self) -> bool {
        self.axes.is_latched()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CountSpec, Variant};
    use crate::gestures::fixtures::{frame, palm};
    use crate::target::{DirectObject, OrbitCamera};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn mapper() -> TransformMapper {
        TransformMapper::new(300.0)
    }

    fn one_hand(x: f32, y: f32, z: f32, fingers: usize) -> Frame {
        frame(vec![palm(x, y, z)], fingers)
    }

    #[test]
    fn rotate_tilt_raises_polar_angle() {
        let cfg = ControlsConfig::for_variant(Variant::CameraOrbit);
        let mut cam = OrbitCamera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let mut rot = RotateController::default();

        assert_eq!(rot.update(&one_hand(0.0, 100.0, 0.0, 2), &cfg, &mapper(), &mut cam), Tick::Applied);
        assert!(cam.camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 10.0), 1e-5));

        rot.update(&one_hand(0.0, 150.0, 0.0, 2), &cfg, &mapper(), &mut cam);
        let angle = cam.camera.position.angle_between(Vec3::Y);
        assert!((angle - (FRAC_PI_2 + PI / 8.0)).abs() < 1e-4);
        assert!((cam.camera.position.length() - 10.0).abs() < 1e-4);
        // still facing the target
        let forward = cam.camera.rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(-cam.camera.position.normalize(), 1e-4));
    }

    #[test]
    fn rotate_yaw_turns_camera_about_up() {
        let cfg = ControlsConfig::for_variant(Variant::CameraOrbit);
        let mut cam = OrbitCamera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let mut rot = RotateController::default();
        rot.update(&one_hand(0.0, 0.0, 0.0, 2), &cfg, &mapper(), &mut cam);
        // +200 palm x maps to PI/2; the camera turns by -PI/2 about +Y
        rot.update(&one_hand(200.0, 0.0, 0.0, 2), &cfg, &mapper(), &mut cam);
        assert!(cam.camera.position.abs_diff_eq(Vec3::new(-10.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn rotate_tilt_stops_at_lower_bound() {
        let cfg = ControlsConfig::for_variant(Variant::CameraOrbit);
        let mut cam = OrbitCamera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let mut rot = RotateController::default();
        rot.update(&one_hand(0.0, 0.0, 0.0, 2), &cfg, &mapper(), &mut cam);
        let before = cam.camera.position;
        // -250 maps to -5PI/8, past min = 0 from PI/2
        let tick = rot.update(&one_hand(0.0, -250.0, 0.0, 2), &cfg, &mapper(), &mut cam);
        assert_eq!(tick, Tick::Dropped);
        assert!(cam.camera.position.abs_diff_eq(before, 1e-5));
        // baseline still advanced
        assert_eq!(rot.axes.vertical.baseline(), Some(-250.0));
    }

    #[test]
    fn object_rotate_yaw_adds_to_orientation() {
        let cfg = ControlsConfig::for_variant(Variant::Object);
        let mut obj = DirectObject::new(Pose::at(Vec3::ZERO), Vec3::new(0.0, 0.0, 300.0));
        let mut rot = RotateController::default();
        rot.update(&one_hand(0.0, 0.0, 0.0, 2), &cfg, &mapper(), &mut obj);
        // speed 4: 25 units -> 4 * PI/16 = PI/4
        rot.update(&one_hand(25.0, 0.0, 0.0, 2), &cfg, &mapper(), &mut obj);
        let expected = Quat::from_rotation_y(PI / 4.0);
        assert!(obj.object.rotation.abs_diff_eq(expected, 1e-4));
        assert_eq!(obj.object.position, Vec3::ZERO);
    }

    #[test]
    fn object_ignores_vertical_motion() {
        let cfg = ControlsConfig::for_variant(Variant::Object);
        let mut obj = DirectObject::new(Pose::at(Vec3::ZERO), Vec3::new(0.0, 0.0, 300.0));
        let mut rot = RotateController::default();
        rot.update(&one_hand(0.0, 0.0, 0.0, 2), &cfg, &mapper(), &mut obj);
        let tick = rot.update(&one_hand(0.0, 20.0, 0.0, 2), &cfg, &mapper(), &mut obj);
        assert_eq!(tick, Tick::Applied);
        assert!(obj.object.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
        // vertical axis still latched
        assert_eq!(rot.axes.vertical.baseline(), Some(20.0));

        // mixed motion only yaws
        rot.update(&one_hand(25.0, 300.0, 0.0, 2), &cfg, &mapper(), &mut obj);
        let expected = Quat::from_rotation_y(PI / 4.0);
        assert!(obj.object.rotation.abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn tilt_landing_exactly_on_bound_is_dropped() {
        let mut cfg = ControlsConfig::for_variant(Variant::CameraOrbit);
        let start = Vec3::new(0.0, 0.0, 10.0);
        let step = mapper().map(&cfg, Action::Rotate, Output::Angle, 100.0);
        cfg.rotate.max = Some(start.angle_between(Vec3::Y) + step);
        let mut cam = OrbitCamera::new(start, Vec3::ZERO);
        let mut rot = RotateController::default();

        rot.update(&one_hand(0.0, 0.0, 0.0, 2), &cfg, &mapper(), &mut cam);
        let tick = rot.update(&one_hand(0.0, 100.0, 0.0, 2), &cfg, &mapper(), &mut cam);
        assert_eq!(tick, Tick::Dropped);
        assert_eq!(cam.camera.position, start);
    }

    #[test]
    fn zoom_moves_along_view_vector_within_planes() {
        let cfg = {
            let mut c = ControlsConfig::for_variant(Variant::CameraOrbit);
            c.zoom.min = Some(1.0);
            c.zoom.max = Some(1000.0);
            c
        };
        let mut cam = OrbitCamera::new(Vec3::new(0.0, 0.0, 300.0), Vec3::ZERO);
        let mut zoom = ZoomController::default();
        zoom.update(&one_hand(0.0, 0.0, 0.0, 4), &cfg, &mapper(), &mut cam);
        // +40 maps to 30 scene units closer
        assert_eq!(zoom.update(&one_hand(0.0, 0.0, 40.0, 4), &cfg, &mapper(), &mut cam), Tick::Applied);
        assert!(cam.camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 270.0), 1e-3));

        // 270 - 300 < near
        assert_eq!(zoom.update(&one_hand(0.0, 0.0, 440.0, 4), &cfg, &mapper(), &mut cam), Tick::Dropped);
        assert!(cam.camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 270.0), 1e-3));
    }

    #[test]
    fn scale_is_uniform() {
        let cfg = ControlsConfig::for_variant(Variant::ObjectOrbit);
        let mut obj = DirectObject::new(Pose::at(Vec3::ZERO), Vec3::new(0.0, 0.0, 300.0));
        let mut zoom = ZoomController::default();
        zoom.update(&one_hand(0.0, 0.0, 0.0, 5), &cfg, &mapper(), &mut obj);
        zoom.update(&one_hand(0.0, 0.0, 100.0, 5), &cfg, &mapper(), &mut obj);
        assert!(obj.object.scale.abs_diff_eq(Vec3::splat(1.5), 1e-5));
    }

    #[test]
    fn pan_shifts_camera_and_target_together() {
        let cfg = ControlsConfig::for_variant(Variant::CameraOrbit);
        let mut cam = OrbitCamera::new(Vec3::new(0.0, 0.0, 300.0), Vec3::ZERO);
        let mut pan = PanController::default();
        let two = |x: f32| frame(vec![palm(x - 100.0, 0.0, 0.0), palm(x, 0.0, 0.0)], 8);
        pan.update(&two(0.0), &cfg, &mapper(), &mut cam);
        pan.update(&two(40.0), &cfg, &mapper(), &mut cam);
        // right hand moved +40 -> 30 units along camera x, subtracted
        assert!(cam.target.abs_diff_eq(Vec3::new(-30.0, 0.0, 0.0), 1e-3));
        assert!(cam.camera.position.abs_diff_eq(Vec3::new(-30.0, 0.0, 300.0), 1e-3));
    }

    #[test]
    fn pan_moves_object_with_hand() {
        let cfg = ControlsConfig::for_variant(Variant::Object);
        let mut obj = DirectObject::new(Pose::at(Vec3::ZERO), Vec3::new(0.0, 0.0, 300.0));
        let mut pan = PanController::default();
        let two = |y: f32| frame(vec![palm(-50.0, y, 0.0), palm(50.0, y, 0.0)], 10);
        pan.update(&two(0.0), &cfg, &mapper(), &mut obj);
        pan.update(&two(-80.0), &cfg, &mapper(), &mut obj);
        assert!(obj.object.position.abs_diff_eq(Vec3::new(0.0, -60.0, 0.0), 1e-3));
    }

    #[test]
    fn inactive_clears_own_latches() {
        let mut cfg = ControlsConfig::for_variant(Variant::CameraOrbit);
        cfg.pan.hands = CountSpec::Exact(1);
        cfg.pan.fingers = CountSpec::Exact(1);
        let mut cam = OrbitCamera::new(Vec3::new(0.0, 0.0, 300.0), Vec3::ZERO);
        let mut pan = PanController::default();
        pan.update(&one_hand(0.0, 0.0, 0.0, 1), &cfg, &mapper(), &mut cam);
        assert!(pan.is_tracking());
        assert_eq!(pan.update(&one_hand(0.0, 0.0, 0.0, 3), &cfg, &mapper(), &mut cam), Tick::Inactive);
        assert!(!pan.is_tracking());
    }
}
