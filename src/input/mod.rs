/// Input events and scoped subscriptions.
pub mod events;
/// Keyboard to movement-axis mapping.
pub mod keyboard;
