/// Eye blink scheduling.
pub mod blink;
/// Character state machine.
pub mod character;
/// Composed character draw.
pub mod draw;
/// Weapon swing and jab behaviors.
pub mod weapon;
