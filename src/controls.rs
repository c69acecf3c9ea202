use log::debug;
use serde::Serialize;

use crate::actions::{ActionController, PanController, RotateController, Tick, ZoomController};
use crate::config::{Action, ControlsConfig, Profile};
use crate::frame::Frame;
use crate::mapping::{TransformMapper, derive_step};
use crate::target::{SceneTarget, Snapshot, TargetAdapter};

/// Per-action outcome of one `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub rotate: Tick,
    pub zoom: Tick,
    pub pan: Tick,
}

impl Report {
    const IDLE: Report = Report {
        rotate: Tick::Inactive,
        zoom: Tick::Inactive,
        pan: Tick::Inactive,
    };
}

#[derive(Debug, Clone)]
pub struct Controls<T: TargetAdapter> {
    pub config: ControlsConfig,
    pub target: T,
    mapper: TransformMapper,
    rotate: RotateController,
    zoom: ZoomController,
    pan: PanController,
}

impl<T: TargetAdapter> Controls<T> {
    /// `step` is fixed for the lifetime of the controls.
    pub fn new(config: ControlsConfig, target: T, step: f32) -> Self {
        Self {
            config,
            target,
            mapper: TransformMapper::new(step),
            rotate: RotateController::default(),
            zoom: ZoomController::default(),
            pan: PanController::default(),
        }
    }

    pub fn step(&self) -> f32 {
        self.mapper.step()
    }

    /// Controllers run in a fixed order: rotate, zoom, pan. An active one
    /// clears the other two's latches, so the last active keeps its baseline.
    pub fn update(&mut self, frame: &Frame) -> Report {
        if !self.config.enabled {
            return Report::IDLE;
        }

        let rotate = self
            .rotate
            .update(frame, &self.config, &self.mapper, &mut self.target);
        if rotate.is_active() {
            self.zoom.reset();
            self.pan.reset();
        }

        let zoom = self
            .zoom
            .update(frame, &self.config, &self.mapper, &mut self.target);
        if zoom.is_active() {
            self.rotate.reset();
            self.pan.reset();
        }

        let pan = self
            .pan
            .update(frame, &self.config, &self.mapper, &mut self.target);
        if pan.is_active() {
            self.rotate.reset();
            self.zoom.reset();
        }

        Report { rotate, zoom, pan }
    }

    /// Swap in a new configuration, dropping every latch.
    pub fn reconfigure(&mut self, config: ControlsConfig) {
        debug!("controls reconfigured");
        self.config = config;
        self.rotate.reset();
        self.zoom.reset();
        self.pan.reset();
    }

    pub fn is_tracking(&self, action: Action) -> bool {
        match action {
            Action::Rotate => self.rotate.is_tracking(),
            Action::Zoom => self.zoom.is_tracking(),
            Action::Pan => self.pan.is_tracking(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::of(&self.target)
    }
}

impl Controls<SceneTarget> {
    /// Build controls and their target from a resolved profile.
    pub fn from_profile(profile: &Profile) -> Self {
        let scene = &profile.scene;
        let step = derive_step(scene.camera_position.z, scene.near, scene.far);
        let target = SceneTarget::from_scene(profile.variant, scene);
        Self::new(profile.controls.clone(), target, step)
    }
}

/// One line of `replay --trace` / `follow` output.
#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    pub tick: usize,
    pub active: Option<Action>,
    #[serde(flatten)]
    pub state: Snapshot,
}

impl TickRecord {
    pub fn new(tick: usize, report: &Report, state: Snapshot) -> Self {
        // the last active controller in evaluation order owns the tick
        let active = [
            (Action::Pan, report.pan),
            (Action::Zoom, report.zoom),
            (Action::Rotate, report.rotate),
        ]
        .into_iter()
        .find(|(_, t)| t.is_active())
        .map(|(a, _)| a);
        Self {
            tick,
            active,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CountSpec, Variant};
    use crate::gestures::fixtures::{frame, palm};
    use crate::mapping::map_linear;
    use crate::target::{DirectObject, OrbitCamera, Pose};
    use glam::Vec3;
    use std::f32::consts::PI;

    fn orbit_controls() -> Controls<OrbitCamera> {
        let mut cfg = ControlsConfig::for_variant(Variant::CameraOrbit);
        cfg.zoom.min = Some(1.0);
        cfg.zoom.max = Some(1000.0);
        Controls::new(cfg, OrbitCamera::new(Vec3::new(0.0, 0.0, 300.0), Vec3::ZERO), 300.0)
    }

    fn polar(c: &Controls<OrbitCamera>) -> f32 {
        (c.target.camera.position - c.target.target).angle_between(Vec3::Y)
    }

    fn tracking(c: &Controls<impl TargetAdapter>) -> [bool; 3] {
        [
            c.is_tracking(Action::Rotate),
            c.is_tracking(Action::Zoom),
            c.is_tracking(Action::Pan),
        ]
    }

    #[test]
    fn disabled_controls_do_nothing() {
        let mut c = orbit_controls();
        c.config.enabled = false;
        let before = c.snapshot();
        assert_eq!(c.update(&frame(vec![palm(0.0, 100.0, 0.0)], 2)), Report::IDLE);
        assert_eq!(c.update(&frame(vec![palm(0.0, 300.0, 0.0)], 2)), Report::IDLE);
        assert_eq!(c.snapshot(), before);
        assert_eq!(tracking(&c), [false; 3]);
    }

    #[test]
    fn palm_rising_orbits_monotonically() {
        let mut c = orbit_controls();
        let per_tick = map_linear(50.0, -400.0, 400.0, -PI, PI);
        let mut angles = vec![polar(&c)];
        for y in [100.0, 150.0, 200.0] {
            let r = c.update(&frame(vec![palm(0.0, y, 0.0)], 2));
            assert_eq!(r.rotate, Tick::Applied);
            angles.push(polar(&c));
        }
        // first tick only latches
        assert!((angles[1] - angles[0]).abs() < 1e-5);
        for w in angles[1..].windows(2) {
            assert!(w[1] > w[0]);
            assert!((w[1] - w[0] - per_tick).abs() < 1e-4);
        }
    }

    #[test]
    fn right_hand_drives_two_handed_gesture() {
        let mut c = orbit_controls();
        c.config.zoom.hands = CountSpec::Exact(2);
        c.config.zoom.fingers = CountSpec::Range(4, 5);
        c.config.zoom.prefer_right_hand = true;
        // left hand moves a lot, right hand (x = 40) moves +40 in z
        c.update(&frame(vec![palm(-50.0, 0.0, 0.0), palm(40.0, 0.0, 0.0)], 5));
        let r = c.update(&frame(vec![palm(40.0, 0.0, 40.0), palm(-50.0, 0.0, 300.0)], 5));
        assert_eq!(r.zoom, Tick::Applied);
        assert!((c.target.camera.position.z - 270.0).abs() < 1e-3);
    }

    #[test]
    fn lost_hand_relatches_without_jump() {
        let mut c = orbit_controls();
        c.update(&frame(vec![palm(0.0, 100.0, 0.0)], 2));
        c.update(&frame(vec![palm(0.0, 120.0, 0.0)], 2));
        assert!(c.is_tracking(Action::Rotate));
        let before = c.snapshot();

        let r = c.update(&frame(vec![], 2));
        assert_eq!(r.rotate, Tick::Inactive);
        assert!(!c.is_tracking(Action::Rotate));

        // hand returns far away: no movement on the relatch tick
        c.update(&frame(vec![palm(0.0, 390.0, 0.0)], 2));
        let after = c.snapshot();
        assert!(after.pose.position.abs_diff_eq(before.pose.position, 1e-3));
        assert!(c.is_tracking(Action::Rotate));
    }

    #[test]
    fn scale_over_max_is_dropped_but_baseline_moves() {
        let mut cfg = ControlsConfig::for_variant(Variant::ObjectOrbit);
        cfg.zoom.max = Some(10.0);
        let object = Pose {
            scale: Vec3::splat(9.0),
            ..Pose::at(Vec3::ZERO)
        };
        let mut c = Controls::new(cfg, DirectObject::new(object, Vec3::new(0.0, 0.0, 300.0)), 300.0);

        c.update(&frame(vec![palm(0.0, 0.0, 0.0)], 4));
        // 600 units -> +3.0, candidate 12
        let r = c.update(&frame(vec![palm(0.0, 0.0, 600.0)], 4));
        assert_eq!(r.zoom, Tick::Dropped);
        assert_eq!(c.target.object.scale, Vec3::splat(9.0));
        assert_eq!(c.zoom.axis.depth.baseline(), Some(600.0));

        // a small step back from the new baseline is accepted
        c.update(&frame(vec![palm(0.0, 0.0, 560.0)], 4));
        assert!(c.target.object.scale.abs_diff_eq(Vec3::splat(8.8), 1e-4));
    }

    #[test]
    fn exactly_one_action_keeps_latches() {
        let shapes: [(Action, Frame); 3] = [
            (Action::Rotate, frame(vec![palm(0.0, 0.0, 0.0)], 2)),
            (Action::Zoom, frame(vec![palm(0.0, 0.0, 0.0)], 5)),
            (Action::Pan, frame(vec![palm(-10.0, 0.0, 0.0), palm(10.0, 0.0, 0.0)], 8)),
        ];
        for (first, a) in &shapes {
            for (second, b) in &shapes {
                if first == second {
                    continue;
                }
                let mut c = orbit_controls();
                c.update(a);
                c.update(b);
                let t = tracking(&c);
                let idx = |x: Action| x as usize;
                assert!(t[idx(*second)], "{second} should track after {first}");
                assert_eq!(t.iter().filter(|v| **v).count(), 1);
            }
        }
    }

    #[test]
    fn overlapping_shapes_resolve_in_fixed_order() {
        let mut c = orbit_controls();
        // rotate and zoom both accept 3 fingers; zoom runs second and wins
        c.config.zoom.fingers = CountSpec::Range(3, 5);
        let r = c.update(&frame(vec![palm(0.0, 0.0, 0.0)], 3));
        assert!(r.rotate.is_active() && r.zoom.is_active());
        assert_eq!(tracking(&c), [false, true, false]);
        let rec = TickRecord::new(0, &r, c.snapshot());
        assert_eq!(rec.active, Some(Action::Zoom));
    }

    #[test]
    fn reconfigure_drops_latches() {
        let mut c = orbit_controls();
        c.update(&frame(vec![palm(0.0, 0.0, 0.0)], 2));
        assert!(c.is_tracking(Action::Rotate));
        c.reconfigure(ControlsConfig::for_variant(Variant::Camera));
        assert_eq!(tracking(&c), [false; 3]);
    }

    #[test]
    fn profile_builds_matching_target() {
        let profile = Profile::for_variant("p", Variant::ObjectOrbit);
        let c = Controls::from_profile(&profile);
        assert_eq!(c.step(), 300.0);
        assert!(c.target.orbit_target().is_none());

        let mut profile = Profile::for_variant("p", Variant::CameraOrbit);
        profile.scene.camera_position = Vec3::new(0.0, 50.0, 0.0);
        let c = Controls::from_profile(&profile);
        assert_eq!(c.step(), 100.0);
        assert_eq!(c.snapshot().target, Some(Vec3::ZERO));
    }
}
