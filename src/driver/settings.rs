use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{Rgba8, Vec2};
use crate::foundation::error::{PuffsError, PuffsResult};
use crate::motion::camera::CameraSettings;
use crate::render::outline::OutlineSettings;
use crate::rig::character::RigSettings;

/// Output surface size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Viewport {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl Viewport {
    /// Size as a vector.
    pub fn size(self) -> Vec2 {
        Vec2::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Frame driver configuration; every field has a default.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Output surface size.
    pub viewport: Viewport,
    /// Upper bound on a frame delta, seconds.
    pub max_delta_secs: f64,
    /// Seed for every random choice (shake, blink, randomizer).
    pub seed: u64,
    /// Texture tasks run per tick.
    pub tasks_per_tick: usize,
    /// Background fill.
    pub clear_rgba: Rgba8,
    /// Initial outline color and thickness.
    pub outline: OutlineSettings,
    /// Camera tuning.
    pub camera: CameraSettings,
    /// Character tuning.
    pub rig: RigSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            max_delta_secs: 0.05,
            seed: 1,
            tasks_per_tick: 16,
            clear_rgba: Rgba8::new(20, 10, 30, 255),
            outline: OutlineSettings::default(),
            camera: CameraSettings::default(),
            rig: RigSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings JSON and validate it.
    pub fn from_json(json: &str) -> PuffsResult<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| PuffsError::serde(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a settings file.
    pub fn from_path(path: &Path) -> PuffsResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// Reject values the frame loop cannot run with.
    pub fn validate(&self) -> PuffsResult<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(PuffsError::validation("viewport must be non-empty"));
        }
        if !(self.max_delta_secs.is_finite() && self.max_delta_secs > 0.0) {
            return Err(PuffsError::validation("max_delta_secs must be > 0"));
        }
        self.outline.validate()?;
        self.camera.validate()?;
        let rig = &self.rig;
        if !(rig.width > 0.0 && rig.height > 0.0) {
            return Err(PuffsError::validation("rig size must be > 0"));
        }
        if !(rig.max_look.is_finite() && rig.max_look >= 0.0) {
            return Err(PuffsError::validation("rig max_look must be >= 0"));
        }
        if rig.blink_min_delay > rig.blink_max_delay
            || rig.blink_min_duration > rig.blink_max_duration
        {
            return Err(PuffsError::validation("blink ranges must have min <= max"));
        }
        Ok(())
    }
}
