use anyhow::{Context, Result, anyhow};
use directories::UserDirs;
use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    f32::consts::PI,
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Rotate,
    /// Zoom for camera adapters, uniform scale for object adapters.
    Zoom,
    Pan,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Rotate => "rotate",
            Action::Zoom => "zoom",
            Action::Pan => "pan",
        })
    }
}

/// Which controller flavour a profile drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Camera orbiting a target point, with fingertip options.
    #[default]
    CameraOrbit,
    /// Camera orbiting a target point, palm only.
    Camera,
    /// Object manipulated in place, with fingertip options.
    ObjectOrbit,
    /// Object manipulated in place, palm only.
    Object,
}

impl Variant {
    pub fn is_camera(self) -> bool {
        matches!(self, Variant::CameraOrbit | Variant::Camera)
    }

    /// Simplified variants always read the raw palm position.
    pub fn has_fingertip_options(self) -> bool {
        matches!(self, Variant::CameraOrbit | Variant::ObjectOrbit)
    }
}

/// A hand or finger count: exact, or an inclusive `[lo, hi]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountSpec {
    Exact(usize),
    Range(usize, usize),
}

impl CountSpec {
    pub fn matches(self, value: usize) -> bool {
        match self {
            CountSpec::Exact(n) => value == n,
            CountSpec::Range(lo, hi) => lo <= value && value <= hi,
        }
    }

    /// True when it admits exactly one finger and nothing else.
    pub fn is_single(self) -> bool {
        matches!(self, CountSpec::Exact(1) | CountSpec::Range(1, 1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureConfig {
    pub enabled: bool,
    pub speed: f32,
    pub hands: CountSpec,
    pub fingers: CountSpec,
    pub prefer_right_hand: bool,
    pub use_hand_position: bool,
    pub use_stabilized: bool,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl GestureConfig {
    pub fn defaults(action: Action, variant: Variant) -> Self {
        let object = !variant.is_camera();
        let (speed, hands, fingers) = match action {
            Action::Rotate => (if object { 4.0 } else { 1.0 }, CountSpec::Exact(1), CountSpec::Range(2, 3)),
            Action::Zoom => (1.0, CountSpec::Exact(1), CountSpec::Range(4, 5)),
            Action::Pan => (1.0, CountSpec::Exact(2), CountSpec::Range(6, 12)),
        };
        let (min, max) = match (action, variant) {
            (Action::Rotate, Variant::CameraOrbit) => (Some(0.0), Some(PI)),
            (Action::Zoom, Variant::ObjectOrbit) => (Some(0.1), Some(10.0)),
            (Action::Zoom, Variant::Object) => (Some(0.1), Some(5.0)),
            // camera-orbit zoom bounds come from the scene's near/far planes
            _ => (None, None),
        };
        Self {
            enabled: true,
            speed,
            hands,
            fingers,
            prefer_right_hand: true,
            use_hand_position: true,
            use_stabilized: false,
            min,
            max,
        }
    }

    /// Open-interval bound check; a missing side is unbounded.
    pub fn within_bounds(&self, value: f32) -> bool {
        self.min.is_none_or(|lo| lo < value) && self.max.is_none_or(|hi| value < hi)
    }
}

/// Partial `[rotate]` / `[zoom]` / `[pan]` table layered over variant defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GestureOverrides {
    pub enabled: Option<bool>,
    pub speed: Option<f32>,
    pub hands: Option<CountSpec>,
    pub fingers: Option<CountSpec>,
    #[serde(alias = "prefer_right_handed")]
    pub prefer_right_hand: Option<bool>,
    pub use_hand_position: Option<bool>,
    pub use_stabilized: Option<bool>,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl GestureOverrides {
    fn apply(&self, base: &mut GestureConfig) {
        if let Some(v) = self.enabled {
            base.enabled = v;
        }
        if let Some(v) = self.speed {
            base.speed = v;
        }
        if let Some(v) = self.hands {
            base.hands = v;
        }
        if let Some(v) = self.fingers {
            base.fingers = v;
        }
        if let Some(v) = self.prefer_right_hand {
            base.prefer_right_hand = v;
        }
        if let Some(v) = self.use_hand_position {
            base.use_hand_position = v;
        }
        if let Some(v) = self.use_stabilized {
            base.use_stabilized = v;
        }
        if self.min.is_some() {
            base.min = self.min;
        }
        if self.max.is_some() {
            base.max = self.max;
        }
    }

    fn sets_fingertip_options(&self) -> bool {
        self.use_hand_position == Some(false) || self.use_stabilized == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlsConfig {
    pub enabled: bool,
    /// Extra gain for fingertip-driven actions; `None` for simplified variants.
    pub finger_factor: Option<f32>,
    pub rotate: GestureConfig,
    pub zoom: GestureConfig,
    pub pan: GestureConfig,
}

impl ControlsConfig {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            enabled: true,
            finger_factor: variant.has_fingertip_options().then_some(DEFAULT_FINGER_FACTOR),
            rotate: GestureConfig::defaults(Action::Rotate, variant),
            zoom: GestureConfig::defaults(Action::Zoom, variant),
            pan: GestureConfig::defaults(Action::Pan, variant),
        }
    }

    pub fn gesture(&self, action: Action) -> &GestureConfig {
        match action {
            Action::Rotate => &self.rotate,
            Action::Zoom => &self.zoom,
            Action::Pan => &self.pan,
        }
    }

    pub fn gesture_mut(&mut self, action: Action) -> &mut GestureConfig {
        match action {
            Action::Rotate => &mut self.rotate,
            Action::Zoom => &mut self.zoom,
            Action::Pan => &mut self.pan,
        }
    }
}

pub const DEFAULT_FINGER_FACTOR: f32 = 2.0;

/// Initial scene state handed to the target adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub camera_position: Vec3,
    pub near: f32,
    pub far: f32,
    pub target: Vec3,
    pub object_position: Vec3,
    pub object_scale: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera_position: Vec3::new(0.0, 0.0, 300.0),
            near: 1.0,
            far: 1000.0,
            target: Vec3::ZERO,
            object_position: Vec3::ZERO,
            object_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
    #[serde(default)]
    pub variant: Variant,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ControlsFile {
    enabled: Option<bool>,
    finger_factor: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    controls: ControlsFile,
    #[serde(default)]
    rotate: GestureOverrides,
    #[serde(default, alias = "scale")]
    zoom: GestureOverrides,
    #[serde(default)]
    pan: GestureOverrides,
    #[serde(default)]
    scene: SceneConfig,
}

/// A fully resolved profile: variant defaults with the file's tables applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub name: String,
    pub variant: Variant,
    pub controls: ControlsConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{action}.speed must be a positive finite number, got {value}")]
    Speed { action: Action, value: f32 },
    #[error("{action}.{field} range [{lo}, {hi}] is inverted")]
    InvertedCount {
        action: Action,
        field: &'static str,
        lo: usize,
        hi: usize,
    },
    #[error("{action}: min ({min}) must be below max ({max})")]
    Bounds { action: Action, min: f32, max: f32 },
    #[error("controls.finger_factor must be a positive finite number, got {0}")]
    FingerFactor(f32),
    #[error("scene near/far must satisfy 0 < near < far, got near={near} far={far}")]
    Planes { near: f32, far: f32 },
    #[error("scene.object_scale must be positive, got {0}")]
    ObjectScale(f32),
    #[error("scene.{0} has non-finite coordinates")]
    NonFinite(&'static str),
}

impl Profile {
    pub fn for_variant(name: &str, variant: Variant) -> Self {
        let scene = SceneConfig::default();
        let mut controls = ControlsConfig::for_variant(variant);
        if variant == Variant::CameraOrbit {
            controls.zoom.min = Some(scene.near);
            controls.zoom.max = Some(scene.far);
        }
        Self {
            name: name.to_string(),
            variant,
            controls,
            scene,
        }
    }

    pub fn from_toml_str(fallback_name: &str, text: &str) -> Result<Self> {
        let file: ProfileFile = toml::from_str(text)?;
        let profile = Self::resolve(fallback_name, file);
        profile.validate()?;
        profile.warn_preconditions();
        Ok(profile)
    }

    fn resolve(fallback_name: &str, file: ProfileFile) -> Self {
        let variant = file.meta.variant;
        let name = file.meta.name.unwrap_or_else(|| fallback_name.to_string());
        let mut controls = ControlsConfig::for_variant(variant);
        if variant == Variant::CameraOrbit {
            controls.zoom.min = Some(file.scene.near);
            controls.zoom.max = Some(file.scene.far);
        }

        if let Some(v) = file.controls.enabled {
            controls.enabled = v;
        }
        match file.controls.finger_factor {
            Some(f) if variant.has_fingertip_options() => controls.finger_factor = Some(f),
            Some(_) => warn!("profile '{name}': finger_factor ignored for {variant:?}"),
            None => {}
        }

        for (action, overrides) in [
            (Action::Rotate, &file.rotate),
            (Action::Zoom, &file.zoom),
            (Action::Pan, &file.pan),
        ] {
            let g = controls.gesture_mut(action);
            overrides.apply(g);
            if !variant.has_fingertip_options() && overrides.sets_fingertip_options() {
                warn!("profile '{name}': {action} fingertip options ignored for {variant:?}");
                g.use_hand_position = true;
                g.use_stabilized = false;
            }
        }

        Self {
            name,
            variant,
            controls,
            scene: file.scene,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let s = &self.scene;
        if !(s.near > 0.0 && s.near < s.far && s.far.is_finite()) {
            return Err(ConfigError::Planes {
                near: s.near,
                far: s.far,
            });
        }
        if !(s.object_scale.is_finite() && s.object_scale > 0.0) {
            return Err(ConfigError::ObjectScale(s.object_scale));
        }
        for (field, v) in [
            ("camera_position", s.camera_position),
            ("target", s.target),
            ("object_position", s.object_position),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::NonFinite(field));
            }
        }

        let c = &self.controls;
        if let Some(f) = c.finger_factor {
            if !(f.is_finite() && f > 0.0) {
                return Err(ConfigError::FingerFactor(f));
            }
        }
        for action in [Action::Rotate, Action::Zoom, Action::Pan] {
            let g = c.gesture(action);
            if !(g.speed.is_finite() && g.speed > 0.0) {
                return Err(ConfigError::Speed {
                    action,
                    value: g.speed,
                });
            }
            for (field, spec) in [("hands", g.hands), ("fingers", g.fingers)] {
                if let CountSpec::Range(lo, hi) = spec {
                    if lo > hi {
                        return Err(ConfigError::InvertedCount { action, field, lo, hi });
                    }
                }
            }
            if let (Some(min), Some(max)) = (g.min, g.max) {
                if min >= max {
                    return Err(ConfigError::Bounds { action, min, max });
                }
            }
        }

        Ok(())
    }

    fn warn_preconditions(&self) {
        let r = &self.controls.rotate;
        if !self.variant.is_camera() && (r.min.is_some() || r.max.is_some()) {
            warn!(
                "profile '{}': rotate.min/max are ignored, objects only turn about the vertical axis",
                self.name
            );
        }
        for action in [Action::Rotate, Action::Zoom, Action::Pan] {
            let g = self.controls.gesture(action);
            if !g.use_hand_position && !g.fingers.is_single() {
                warn!(
                    "profile '{}': {action} reads the first pointable but fingers = {:?}; expected exactly 1",
                    self.name, g.fingers
                );
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    pub active_name: String,
    pub profile: Profile,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("leapctl"))
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

fn object_profile_text() -> &'static str {
    include_str!("../profiles/object.toml")
}

impl ProfileStore {
    pub fn load_or_install_default() -> Result<Self> {
        Self::open(config_dir()?)
    }

    /// Open a store rooted at `cfgdir`, installing the bundled profiles if missing.
    pub fn open(cfgdir: PathBuf) -> Result<Self> {
        let profdir = cfgdir.join("profiles");
        fs::create_dir_all(&profdir)?;

        for (file, text) in [
            ("default.toml", default_profile_text()),
            ("object.toml", object_profile_text()),
        ] {
            let path = profdir.join(file);
            if !path.exists() {
                fs::write(&path, text)?;
                info!("installed profile at {}", path.display());
            }
        }

        let active_ptr = cfgdir.join("active");
        if !active_ptr.exists() {
            let mut f = fs::File::create(&active_ptr)?;
            f.write_all(b"default")?;
        }

        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();
        let profile = load_path(&profdir.join(format!("{active_name}.toml")))?;

        Ok(Self {
            active_name,
            profile,
            profiles_dir: profdir,
            active_ptr,
        })
    }

    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.toml"))
    }

    pub fn load_profile(&self, name: &str) -> Result<Profile> {
        load_path(&self.profile_path(name))
    }

    pub fn reload(&mut self) -> Result<()> {
        self.profile = self.load_profile(&self.active_name)?;
        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.profile_path(name);
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        self.profile = load_path(&p)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        info!("active profile is now '{name}'");
        Ok(())
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }
}

/// Load and validate a profile file; its stem is the fallback name.
pub fn load_path(path: &Path) -> Result<Profile> {
    let txt =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");
    let profile = Profile::from_toml_str(stem, &txt)
        .with_context(|| format!("failed to load {}", path.display()))?;
    info!("loaded profile '{}' ({:?})", profile.name, profile.variant);
    Ok(profile)
}
