use std::collections::HashSet;

use crate::motion::physics::MoveIntent;

/// Movement keys, named after their DOM `KeyboardEvent.code`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKey {
    /// `ArrowUp`
    ArrowUp,
    /// `ArrowDown`
    ArrowDown,
    /// `ArrowLeft`
    ArrowLeft,
    /// `ArrowRight`
    ArrowRight,
    /// `KeyW`
    KeyW,
    /// `KeyA`
    KeyA,
    /// `KeyS`
    KeyS,
    /// `KeyD`
    KeyD,
}

impl MoveKey {
    /// Map a key code; non-movement keys return `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "KeyW" => Self::KeyW,
            "KeyA" => Self::KeyA,
            "KeyS" => Self::KeyS,
            "KeyD" => Self::KeyD,
            _ => return None,
        })
    }

    fn apply(self, intent: &mut MoveIntent) {
        match self {
            Self::ArrowUp | Self::KeyW => intent.up = true,
            Self::ArrowDown | Self::KeyS => intent.down = true,
            Self::ArrowLeft | Self::KeyA => intent.left = true,
            Self::ArrowRight | Self::KeyD => intent.right = true,
        }
    }
}

/// Held movement keys.
///
/// Two keys bound to the same axis are tracked separately, so releasing one keeps the axis
/// active while the other is still down.
#[derive(Clone, Debug, Default)]
pub struct Keyboard {
    held: HashSet<MoveKey>,
}

impl Keyboard {
    /// Nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key press; auto-repeat and unknown codes are ignored. Returns whether state changed.
    pub fn key_down(&mut self, code: &str, repeat: bool) -> bool {
        if repeat {
            return false;
        }
        MoveKey::from_code(code).is_some_and(|k| self.held.insert(k))
    }

    /// Key release. Returns whether state changed.
    pub fn key_up(&mut self, code: &str) -> bool {
        MoveKey::from_code(code).is_some_and(|k| self.held.remove(&k))
    }

    /// Release everything (focus lost).
    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// Current movement axes.
    pub fn intent(&self) -> MoveIntent {
        let mut intent = MoveIntent::default();
        for key in &self.held {
            key.apply(&mut intent);
        }
        intent
    }
}
