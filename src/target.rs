use glam::{Mat4, Quat, Vec3};
use serde::Serialize;

use crate::config::{SceneConfig, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            rotation: look_rotation(position, target).unwrap_or(Quat::IDENTITY),
            ..Self::at(position)
        }
    }
}

/// World rotation of an entity at `eye` whose -Z axis faces `target`.
///
/// `None` when the direction is degenerate (zero or parallel to world up).
pub fn look_rotation(eye: Vec3, target: Vec3) -> Option<Quat> {
    let forward = (target - eye).normalize_or_zero();
    if forward == Vec3::ZERO || forward.cross(Vec3::Y).length_squared() < 1e-12 {
        return None;
    }
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    Some(Quat::from_mat4(&view).inverse().normalize())
}

pub trait TargetAdapter {
    fn pose(&self) -> Pose;
    fn set_pose(&mut self, pose: Pose);

    /// The point this entity orbits and faces; `None` for in-place manipulation.
    fn orbit_target(&self) -> Option<Vec3>;
    fn set_orbit_target(&mut self, _target: Vec3) {}

    /// Where the scene is seen from. Pan displacements are expressed in its frame.
    fn viewer(&self) -> Pose;
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub camera: Pose,
    pub target: Vec3,
}

impl OrbitCamera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            camera: Pose::looking_at(position, target),
            target,
        }
    }
}

impl TargetAdapter for OrbitCamera {
    fn pose(&self) -> Pose {
        self.camera
    }

    fn set_pose(&mut self, pose: Pose) {
        self.camera = pose;
    }

    fn orbit_target(&self) -> Option<Vec3> {
        Some(self.target)
    }

    fn set_orbit_target(&mut self, target: Vec3) {
        self.target = target;
    }

    fn viewer(&self) -> Pose {
        self.camera
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectObject {
    pub object: Pose,
    pub camera: Pose,
}

impl DirectObject {
    pub fn new(object: Pose, camera_position: Vec3) -> Self {
        Self {
            camera: Pose::looking_at(camera_position, object.position),
            object,
        }
    }
}

impl TargetAdapter for DirectObject {
    fn pose(&self) -> Pose {
        self.object
    }

    fn set_pose(&mut self, pose: Pose) {
        self.object = pose;
    }

    fn orbit_target(&self) -> Option<Vec3> {
        None
    }

    fn viewer(&self) -> Pose {
        self.camera
    }
}

/// Runtime choice between the two adapters, picked from a profile's variant.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneTarget {
    Orbit(OrbitCamera),
    Direct(DirectObject),
}

impl SceneTarget {
    pub fn from_scene(variant: Variant, scene: &SceneConfig) -> Self {
        if variant.is_camera() {
            SceneTarget::Orbit(OrbitCamera::new(scene.camera_position, scene.target))
        } else {
            let object = Pose {
                scale: Vec3::splat(scene.object_scale),
                ..Pose::at(scene.object_position)
            };
            SceneTarget::Direct(DirectObject::new(object, scene.camera_position))
        }
    }

    fn inner(&self) -> &dyn TargetAdapter {
        match self {
            SceneTarget::Orbit(c) => c as &dyn TargetAdapter,
            SceneTarget::Direct(o) => o as &dyn TargetAdapter,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn TargetAdapter {
        match self {
            SceneTarget::Orbit(c) => c as &mut dyn TargetAdapter,
            SceneTarget::Direct(o) => o as &mut dyn TargetAdapter,
        }
    }
}

impl TargetAdapter for SceneTarget {
    fn pose(&self) -> Pose {
        self.inner().pose()
    }

    fn set_pose(&mut self, pose: Pose) {
        self.inner_mut().set_pose(pose)
    }

    fn orbit_target(&self) -> Option<Vec3> {
        self.inner().orbit_target()
    }

    fn set_orbit_target(&mut self, target: Vec3) {
        self.inner_mut().set_orbit_target(target)
    }

    fn viewer(&self) -> Pose {
        self.inner().viewer()
    }
}

/// Serializable view of a target after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub pose: Pose,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Vec3>,
}

impl Snapshot {
    pub fn of<T: TargetAdapter + ?Sized>(t: &T) -> Self {
        Self {
            pose: t.pose(),
            target: t.orbit_target(),
        }
    }
}
