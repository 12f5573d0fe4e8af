use std::f64::consts::FRAC_1_SQRT_2;

use crate::foundation::core::{Rectangle2D, Vec2};

/// Four boolean movement axes sampled once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveIntent {
    /// Toward negative y.
    pub up: bool,
    /// Toward positive y.
    pub down: bool,
    /// Toward negative x.
    pub left: bool,
    /// Toward positive x.
    pub right: bool,
}

impl MoveIntent {
    /// Net axis direction with components in `{-1, 0, 1}`; opposite keys cancel.
    pub fn axis(self) -> Vec2 {
        let h = f64::from(u8::from(self.right)) - f64::from(u8::from(self.left));
        let v = f64::from(u8::from(self.down)) - f64::from(u8::from(self.up));
        Vec2::new(h, v)
    }

    /// Whether the net axis is zero.
    pub fn is_idle(self) -> bool {
        self.axis() == Vec2::ZERO
    }
}

/// Acceleration for `intent` at `top_speed`; diagonals are scaled by `1/sqrt(2)`.
pub fn movement_acceleration(intent: MoveIntent, top_speed: f64) -> Vec2 {
    let axis = intent.axis();
    let diagonal = if axis.x != 0.0 && axis.y != 0.0 {
        FRAC_1_SQRT_2
    } else {
        1.0
    };
    axis * (top_speed * diagonal)
}

/// Center-anchored body with velocity, caller-owned acceleration and linear drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entity {
    /// Position (center) and size.
    pub bounds: Rectangle2D,
    /// Units per second.
    pub velocity: Vec2,
    /// Units per second squared; overwritten by the owner before every step.
    pub acceleration: Vec2,
    /// Fraction of velocity removed per second.
    pub drag: f64,
}

impl Entity {
    /// Body at rest.
    pub fn new(bounds: Rectangle2D, drag: f64) -> Self {
        Self {
            bounds,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag,
        }
    }

    /// Center position.
    pub fn position(&self) -> Vec2 {
        self.bounds.center()
    }

    /// Teleport the center.
    pub fn set_position(&mut self, p: Vec2) {
        self.bounds.set_center(p);
    }

    /// Sum of absolute velocity components.
    pub fn manhattan_speed(&self) -> f64 {
        self.velocity.x.abs() + self.velocity.y.abs()
    }

    /// Integrate one step of `dt` seconds (semi-implicit Euler with linear drag).
    pub fn step(&mut self, dt: f64) {
        self.velocity += self.acceleration * dt;
        self.velocity -= self.velocity * (self.drag * dt);
        let p = self.position() + self.velocity * dt;
        self.set_position(p);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/physics.rs"]
mod tests;
