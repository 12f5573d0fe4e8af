/// Frame loop.
pub mod frame;
/// JSON settings.
pub mod settings;
