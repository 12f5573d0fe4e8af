use std::f64::consts::TAU;

use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::{PuffsError, PuffsResult};
use crate::foundation::math::Rng64;
use crate::render::canvas::Canvas2D;

/// Camera tuning.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSettings {
    /// Dead-zone half extents as fractions of half the viewport.
    pub drag: [f64; 2],
    /// Pointer parallax gain in world units.
    pub panning: f64,
    /// Exponential follow rate per second.
    pub follow_speed: f64,
    /// Fraction of shake removed per tick.
    pub shake_decay: f64,
    /// Shake below this magnitude snaps to zero.
    pub shake_floor: f64,
    /// Shake impulse of a primary click.
    pub click_shake: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            drag: [0.1, 0.25],
            panning: 5.0,
            follow_speed: 2.0,
            shake_decay: 0.2,
            shake_floor: 0.1,
            click_shake: 5.0,
        }
    }
}

impl CameraSettings {
    /// Reject tuning that would stall or panic the camera.
    pub fn validate(&self) -> PuffsResult<()> {
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !self.drag.iter().copied().all(non_negative) {
            return Err(PuffsError::validation("camera drag must be >= 0"));
        }
        if !non_negative(self.panning) || !non_negative(self.follow_speed) {
            return Err(PuffsError::validation(
                "camera panning and follow_speed must be >= 0",
            ));
        }
        if !(self.shake_decay > 0.0 && self.shake_decay <= 1.0) {
            return Err(PuffsError::validation("camera shake_decay must be in (0, 1]"));
        }
        if !(self.shake_floor.is_finite() && self.shake_floor > 0.0) {
            return Err(PuffsError::validation("camera shake_floor must be > 0"));
        }
        if !non_negative(self.click_shake) {
            return Err(PuffsError::validation("camera click_shake must be >= 0"));
        }
        Ok(())
    }
}

/// Soft-follow camera with pointer parallax and decaying shake.
#[derive(Clone, Debug)]
pub struct Camera {
    settings: CameraSettings,
    viewport: Vec2,
    current: Vec2,
    target: Vec2,
    pointer: Vec2,
    visible: Vec2,
    shake_magnitude: f64,
    shake_direction: f64,
    rng: Rng64,
}

impl Camera {
    /// Camera at the origin for a `viewport`-sized surface.
    pub fn new(settings: CameraSettings, viewport: Vec2, seed: u64) -> Self {
        Self {
            settings,
            viewport,
            current: Vec2::ZERO,
            target: Vec2::ZERO,
            pointer: Vec2::ZERO,
            visible: Vec2::ZERO,
            shake_magnitude: 0.0,
            shake_direction: 0.0,
            rng: Rng64::new(seed),
        }
    }

    /// Tuning in effect.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Resize the viewport.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    /// Viewport size.
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Smoothed position.
    pub fn current(&self) -> Vec2 {
        self.current
    }

    /// Follow target.
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Position including parallax and shake, as of the last update.
    pub fn visible_position(&self) -> Vec2 {
        self.visible
    }

    /// Current shake magnitude.
    pub fn shake_magnitude(&self) -> f64 {
        self.shake_magnitude
    }

    /// World-space pointer used for parallax.
    pub fn set_pointer(&mut self, world: Vec2) {
        self.pointer = world;
    }

    /// Dead-zone half extents in world units.
    pub fn dead_zone(&self) -> Vec2 {
        Vec2::new(
            self.settings.drag[0] * self.viewport.x / 2.0,
            self.settings.drag[1] * self.viewport.y / 2.0,
        )
    }

    /// Drag the target just enough that `point` lies inside the dead zone around it.
    pub fn focus(&mut self, point: Vec2) {
        let zone = self.dead_zone();
        // max/min rather than clamp: a negative zone must not panic.
        self.target.x = self.target.x.max(point.x - zone.x).min(point.x + zone.x);
        self.target.y = self.target.y.max(point.y - zone.y).min(point.y + zone.y);
    }

    /// Add a shake impulse.
    pub fn shake(&mut self, power: f64) {
        if power.is_finite() && power > 0.0 {
            self.shake_magnitude += power;
        }
    }

    /// Jump straight to `point` with no glide.
    pub fn snap(&mut self, point: Vec2) {
        self.current = point;
        self.target = point;
        self.visible = point;
    }

    /// Advance shake and follow by `dt` seconds and recompute the visible position.
    pub fn update(&mut self, dt: f64) {
        if self.shake_magnitude != 0.0 {
            self.shake_direction = self.rng.next_f64_01() * TAU;
            self.shake_magnitude -= self.shake_magnitude * self.settings.shake_decay;
            if self.shake_magnitude < self.settings.shake_floor.max(f64::MIN_POSITIVE) {
                self.shake_magnitude = 0.0;
            }
        }

        let blend = (self.settings.follow_speed * dt).clamp(0.0, 1.0);
        self.current += (self.target - self.current) * blend;

        let half = self.viewport / 2.0;
        let offset = self.pointer - self.current;
        let parallax = Vec2::new(
            parallax_axis(self.settings.panning, offset.x, half.x),
            parallax_axis(self.settings.panning, offset.y, half.y),
        );
        let shake = Vec2::from_angle(self.shake_direction) * self.shake_magnitude;
        self.visible = self.current + parallax + shake;
    }

    /// World-to-device transform: translate by `viewport/2 - visible`.
    pub fn projection(&self) -> Affine {
        Affine::translate(self.viewport / 2.0 - self.visible)
    }

    /// Apply the projection to a surface's transform.
    pub fn project(&self, canvas: &mut Canvas2D) {
        canvas.apply(self.projection());
    }

    /// Apply the projection to a world point.
    pub fn project_point(&self, world: Vec2) -> Vec2 {
        world + (self.viewport / 2.0 - self.visible)
    }

    /// Inverse of [`Camera::project_point`]: device pixels to world.
    pub fn unproject_point(&self, device: Vec2) -> Vec2 {
        device - (self.viewport / 2.0 - self.visible)
    }
}

fn parallax_axis(panning: f64, offset: f64, half: f64) -> f64 {
    if half <= 0.0 {
        return 0.0;
    }
    -panning * offset / half
}

#[cfg(test)]
#[path = "../../tests/unit/motion/camera.rs"]
mod tests;
