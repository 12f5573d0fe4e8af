use crate::animation::ease::peak_ease;
use crate::assets::manifest::BehaviorTag;

/// Spring constants of the swing toggle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwingTuning {
    /// Arc reached on trigger, degrees.
    pub range_deg: f64,
    /// Spring gain per tick.
    pub gain: f64,
    /// Velocity retained per tick.
    pub damping: f64,
    /// Below this angular speed the swing counts as settled.
    pub rest_epsilon: f64,
}

/// Timing of the jab thrust.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JabTuning {
    /// Cycles per second.
    pub rate: f64,
    /// Fraction of the cycle at which the thrust peaks.
    pub peak: f64,
}

/// Motion state of the equipped weapon; always matches the weapon's behavior tag.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum WeaponBehavior {
    /// No weapon, or a weapon without motion.
    #[default]
    None,
    /// Spring-driven arc.
    Swing {
        /// Degrees.
        current_angle: f64,
        /// Either 0 or the swing range, degrees.
        target_angle: f64,
        /// Degrees per tick.
        angular_velocity: f64,
    },
    /// Forward thrust.
    Jab {
        /// Whether a thrust cycle is running.
        thrusting: bool,
        /// Cycle progress in `[0, 1)`.
        progress: f64,
    },
}

impl WeaponBehavior {
    /// Rest state for a behavior tag.
    pub fn for_tag(tag: Option<BehaviorTag>) -> Self {
        match tag {
            None => Self::None,
            Some(BehaviorTag::Swing) => Self::Swing {
                current_angle: 0.0,
                target_angle: 0.0,
                angular_velocity: 0.0,
            },
            Some(BehaviorTag::Jab) => Self::Jab {
                thrusting: false,
                progress: 0.0,
            },
        }
    }

    /// Tag this state belongs to.
    pub fn tag(&self) -> Option<BehaviorTag> {
        match self {
            Self::None => None,
            Self::Swing { .. } => Some(BehaviorTag::Swing),
            Self::Jab { .. } => Some(BehaviorTag::Jab),
        }
    }

    /// Reset to the rest state of `tag` unless already on it; returns whether it reset.
    pub fn sync(&mut self, tag: Option<BehaviorTag>) -> bool {
        if self.tag() == tag {
            return false;
        }
        *self = Self::for_tag(tag);
        true
    }

    /// Primary action: flip the swing target, or start a jab if none is running.
    ///
    /// Returns false when the trigger had no effect.
    pub fn trigger(&mut self, swing: &SwingTuning) -> bool {
        match self {
            Self::None => false,
            Self::Swing { target_angle, .. } => {
                *target_angle = if *target_angle == swing.range_deg {
                    0.0
                } else {
                    swing.range_deg
                };
                true
            }
            Self::Jab { thrusting, .. } => {
                if *thrusting {
                    return false;
                }
                *thrusting = true;
                true
            }
        }
    }

    /// Advance one tick. The swing spring is per tick; the jab uses `dt` seconds.
    pub fn tick(&mut self, dt: f64, swing: &SwingTuning, jab: &JabTuning) {
        match self {
            Self::None => {}
            Self::Swing {
                current_angle,
                target_angle,
                angular_velocity,
            } => {
                *angular_velocity += (*target_angle - *current_angle) * swing.gain;
                *angular_velocity *= swing.damping;
                *current_angle += *angular_velocity;
                if angular_velocity.abs() < swing.rest_epsilon {
                    *target_angle = 0.0;
                }
            }
            Self::Jab {
                thrusting,
                progress,
            } => {
                if !*thrusting {
                    return;
                }
                *progress += jab.rate * dt;
                if *progress >= 1.0 {
                    *progress = 0.0;
                    *thrusting = false;
                }
            }
        }
    }

    /// Swing angle in degrees (0 when not swinging).
    pub fn swing_angle_deg(&self) -> f64 {
        match self {
            Self::Swing { current_angle, .. } => *current_angle,
            _ => 0.0,
        }
    }

    /// Jab extension as a fraction of full reach.
    pub fn jab_extension(&self, jab: &JabTuning) -> f64 {
        match self {
            Self::Jab {
                thrusting: true,
                progress,
            } => peak_ease(*progress, jab.peak),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/weapon.rs"]
mod tests;
