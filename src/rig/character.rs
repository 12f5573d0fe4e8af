use std::f64::consts::{FRAC_PI_3, PI};

use crate::animation::ease::{approach, relax};
use crate::assets::manifest::{BehaviorTag, Slot};
use crate::foundation::core::{Rectangle2D, Vec2};
use crate::foundation::math::Rng64;
use crate::motion::physics::{Entity, MoveIntent, movement_acceleration};
use crate::render::label::truncate_label;
use crate::rig::blink::{Blink, BlinkTiming};
use crate::rig::weapon::{JabTuning, SwingTuning, WeaponBehavior};

/// Character tuning.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RigSettings {
    /// Logical width.
    pub width: f64,
    /// Logical height.
    pub height: f64,
    /// Acceleration at full input, units/s^2.
    pub top_speed: f64,
    /// Linear drag per second.
    pub drag: f64,
    /// `|vx| + |vy|` above which the rig is running.
    pub run_threshold: f64,
    /// Swing arc, degrees.
    pub swing_range_deg: f64,
    /// Swing spring gain per tick.
    pub swing_gain: f64,
    /// Swing velocity retained per tick.
    pub swing_damping: f64,
    /// Swing settle threshold.
    pub swing_rest_epsilon: f64,
    /// Jab cycles per second.
    pub jab_rate: f64,
    /// Jab peak position within the cycle.
    pub jab_peak: f64,
    /// Jab reach as a fraction of body height.
    pub jab_reach: f64,
    /// Arm sway amplitude while idle, radians.
    pub idle_sway: f64,
    /// Arm sway amplitude while running, radians.
    pub run_sway: f64,
    /// Sway and wobble period, seconds per radian.
    pub sway_period: f64,
    /// Sway amplitude response rate per second.
    pub sway_response: f64,
    /// Fraction of pop removed per tick.
    pub pop_response: f64,
    /// Body pop on a facing flip.
    pub direction_pop: f64,
    /// Attachment pop on equip.
    pub attachment_pop: f64,
    /// Maximum eye/mouth offset as a fraction of body size.
    pub max_look: f64,
    /// Shortest wait between blinks, seconds.
    pub blink_min_delay: f64,
    /// Longest wait between blinks, seconds.
    pub blink_max_delay: f64,
    /// Shortest blink, seconds.
    pub blink_min_duration: f64,
    /// Longest blink, seconds.
    pub blink_max_duration: f64,
    /// Label length limit in characters.
    pub name_max_chars: usize,
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            width: 50.0,
            height: 50.0,
            top_speed: 3600.0,
            drag: 10.0,
            run_threshold: 2.0,
            swing_range_deg: 120.0,
            swing_gain: 0.1,
            swing_damping: 0.65,
            swing_rest_epsilon: 1e-6,
            jab_rate: 3.0,
            jab_peak: 0.3,
            jab_reach: 0.5,
            idle_sway: PI / 30.0,
            run_sway: FRAC_PI_3,
            sway_period: 0.2,
            sway_response: 10.0,
            pop_response: 0.1,
            direction_pop: 0.05,
            attachment_pop: 0.25,
            max_look: 0.1,
            blink_min_delay: 2.0,
            blink_max_delay: 5.0,
            blink_min_duration: 0.1,
            blink_max_duration: 0.3,
            name_max_chars: 20,
        }
    }
}

impl RigSettings {
    /// Swing spring constants.
    pub fn swing(&self) -> SwingTuning {
        SwingTuning {
            range_deg: self.swing_range_deg,
            gain: self.swing_gain,
            damping: self.swing_damping,
            rest_epsilon: self.swing_rest_epsilon,
        }
    }

    /// Jab timing.
    pub fn jab(&self) -> JabTuning {
        JabTuning {
            rate: self.jab_rate,
            peak: self.jab_peak,
        }
    }

    /// Blink scheduling bounds.
    pub fn blink(&self) -> BlinkTiming {
        BlinkTiming {
            min_delay: self.blink_min_delay,
            max_delay: self.blink_max_delay,
            min_duration: self.blink_min_duration,
            max_duration: self.blink_max_duration,
        }
    }
}

/// Horizontal facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Toward negative x.
    Left,
    /// Toward positive x.
    Right,
}

impl Direction {
    /// The other side.
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Derived movement state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locomotion {
    /// At (or near) rest.
    Idle,
    /// Moving faster than the run threshold.
    Running,
}

/// "Just changed" scale pulses that spring back to 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pops {
    /// Whole body.
    pub body: f64,
    /// Headwear.
    pub headwear: f64,
    /// Weapon.
    pub weapon: f64,
}

impl Default for Pops {
    fn default() -> Self {
        Self {
            body: 1.0,
            headwear: 1.0,
            weapon: 1.0,
        }
    }
}

/// Procedural character: locomotion, facing, arm sway, blink, pops, equipment and weapon motion.
#[derive(Clone, Debug)]
pub struct Character {
    settings: RigSettings,
    entity: Entity,
    intent: MoveIntent,
    cursor: Vec2,
    direction: Direction,
    locomotion: Locomotion,
    time: f64,
    sway_amplitude: f64,
    pops: Pops,
    blink: Blink,
    weapon: WeaponBehavior,
    headwear_key: Option<String>,
    weapon_key: Option<String>,
    name: String,
    rng: Rng64,
}

impl Character {
    /// Idle character at the origin facing left.
    pub fn new(settings: RigSettings, seed: u64) -> Self {
        let mut rng = Rng64::new(seed);
        let blink = Blink::new(settings.blink(), &mut rng);
        Self {
            entity: Entity::new(
                Rectangle2D::new(0.0, 0.0, settings.width, settings.height),
                settings.drag,
            ),
            settings,
            intent: MoveIntent::default(),
            cursor: Vec2::ZERO,
            direction: Direction::Left,
            locomotion: Locomotion::Idle,
            time: 0.0,
            sway_amplitude: settings.idle_sway,
            pops: Pops::default(),
            blink,
            weapon: WeaponBehavior::None,
            headwear_key: None,
            weapon_key: None,
            name: String::new(),
            rng,
        }
    }

    /// Tuning in effect.
    pub fn settings(&self) -> &RigSettings {
        &self.settings
    }

    /// Physics body.
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Center position.
    pub fn position(&self) -> Vec2 {
        self.entity.position()
    }

    /// Teleport.
    pub fn set_position(&mut self, p: Vec2) {
        self.entity.set_position(p);
    }

    /// Movement axes for the next update.
    pub fn set_intent(&mut self, intent: MoveIntent) {
        self.intent = intent;
    }

    /// World-space pointer.
    pub fn set_cursor(&mut self, world: Vec2) {
        self.cursor = world;
    }

    /// World-space pointer.
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Display name (untruncated).
    pub fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
    }

    /// Display name (untruncated).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as drawn above the head.
    pub fn label(&self) -> String {
        truncate_label(&self.name, self.settings.name_max_chars)
    }

    /// Facing.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Movement state.
    pub fn locomotion(&self) -> Locomotion {
        self.locomotion
    }

    /// Seconds of animation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Pop pulses.
    pub fn pops(&self) -> Pops {
        self.pops
    }

    /// Weapon motion state.
    pub fn weapon(&self) -> &WeaponBehavior {
        &self.weapon
    }

    /// Equipped key for `slot`.
    pub fn equipped(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Headwear => self.headwear_key.as_deref(),
            Slot::Weapon => self.weapon_key.as_deref(),
        }
    }

    /// Equip (or clear) a slot and pulse it. A weapon change always restarts its motion from
    /// the rest state of `tag`.
    pub fn equip(&mut self, slot: Slot, key: Option<&str>, tag: Option<BehaviorTag>) {
        match slot {
            Slot::Headwear => {
                self.headwear_key = key.map(str::to_owned);
                self.pops.headwear += self.settings.attachment_pop;
            }
            Slot::Weapon => {
                self.weapon_key = key.map(str::to_owned);
                self.weapon = WeaponBehavior::for_tag(tag);
                self.pops.weapon += self.settings.attachment_pop;
            }
        }
        tracing::debug!(?slot, key, ?tag, "equipped");
    }

    /// Keep the weapon motion on the equipped weapon's tag.
    pub fn sync_weapon(&mut self, tag: Option<BehaviorTag>) {
        if self.weapon.sync(tag) {
            tracing::debug!(?tag, "weapon behavior resynchronized");
        }
    }

    /// Primary action on the weapon; returns whether anything started.
    pub fn trigger(&mut self) -> bool {
        self.weapon.trigger(&self.settings.swing())
    }

    /// Advance by `dt` seconds (already clamped by the caller).
    pub fn update(&mut self, dt: f64) {
        let s = self.settings;

        self.entity.acceleration = movement_acceleration(self.intent, s.top_speed);
        self.entity.step(dt);

        self.pops.body = relax(self.pops.body, 1.0, s.pop_response);
        self.pops.headwear = relax(self.pops.headwear, 1.0, s.pop_response);
        self.pops.weapon = relax(self.pops.weapon, 1.0, s.pop_response);

        self.locomotion = if self.entity.manhattan_speed() > s.run_threshold {
            Locomotion::Running
        } else {
            Locomotion::Idle
        };

        self.time += dt;
        let sway_target = match self.locomotion {
            Locomotion::Idle => s.idle_sway,
            Locomotion::Running => s.run_sway,
        };
        self.sway_amplitude = approach(self.sway_amplitude, sway_target, s.sway_response, dt);

        self.weapon.tick(dt, &s.swing(), &s.jab());
        self.blink.tick(dt, &mut self.rng);

        let distance = self.cursor.x - self.position().x;
        if distance.abs() > s.width / 8.0 {
            let facing = if distance < 0.0 {
                Direction::Left
            } else {
                Direction::Right
            };
            if facing != self.direction {
                self.pops.body += s.direction_pop;
            }
            self.direction = facing;
        }
    }

    /// Current sway amplitude, radians.
    pub fn sway_amplitude(&self) -> f64 {
        self.sway_amplitude
    }

    /// Free arm angle for the hand on `side`; the two arms are half a cycle apart.
    pub fn arm_angle(&self, side: Direction) -> f64 {
        let phase = self.time / self.settings.sway_period;
        let phase = match side {
            Direction::Left => phase + PI,
            Direction::Right => phase,
        };
        self.sway_amplitude * phase.sin()
    }

    /// Breathing scale applied to the body and held hand.
    pub fn wobble(&self) -> Vec2 {
        let phase = self.time / self.settings.sway_period;
        Vec2::new(1.0 + phase.cos() / 40.0, 1.0 + phase.sin() / 40.0)
    }

    /// Vertical eye scale from the blink cycle.
    pub fn eye_scale(&self) -> f64 {
        self.blink.eye_scale()
    }

    /// Eye/mouth offset toward the pointer, in body units.
    pub fn look_offset(&self) -> Vec2 {
        let s = &self.settings;
        let d = self.cursor - self.position();
        let reach = s.max_look.max(0.0);
        let max = Vec2::new(reach * s.width, reach * s.height);
        Vec2::new(
            (d.x / s.width).clamp(-max.x, max.x),
            (d.y / s.height).clamp(-max.y, max.y),
        )
    }

    /// Angle from the body center to the pointer.
    pub fn aim_angle(&self) -> f64 {
        let d = self.cursor - self.position();
        d.y.atan2(d.x)
    }

    /// Jab extension as a fraction of full reach.
    pub fn jab_extension(&self) -> f64 {
        self.weapon.jab_extension(&self.settings.jab())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/character.rs"]
mod tests;
