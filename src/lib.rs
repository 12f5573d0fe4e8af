//! Puffs renders and animates a customizable 2D avatar while its art is edited live.
//!
//! The crate is organized around a single-threaded frame loop:
//!
//! - Load a [`TextureCatalog`] from an asset manifest
//! - Create a [`FrameDriver`] with [`Settings`]
//! - Feed it [`InputEvent`]s and call [`FrameDriver::tick`] once per display refresh
//! - Read the composed frame from [`FrameDriver::frame`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Easing curves and smoothing.
pub mod animation;
/// Asset manifest, texture assets and the catalog.
pub mod assets;
/// Frame driver and settings.
pub mod driver;
/// Shared value types, errors and random numbers.
pub mod foundation;
/// Input events and keyboard mapping.
pub mod input;
/// Physics and camera.
pub mod motion;
/// Drawing surface, outline generator and procedural layers.
pub mod render;
/// Character rig.
pub mod rig;

pub use assets::catalog::TextureCatalog;
pub use assets::manifest::{BehaviorTag, Manifest, RigPart, Slot, SourceKind};
pub use assets::texture::TextureAsset;
pub use driver::frame::{FrameDriver, FrameStats};
pub use driver::settings::Settings;
pub use foundation::core::{Placement, Rectangle2D, Rgba8, Vec2};
pub use foundation::error::{PuffsError, PuffsResult};
pub use input::events::{EventBus, InputEvent, Subscription};
pub use render::canvas::Canvas2D;
pub use render::outline::{OutlineSettings, Outliner};
pub use rig::character::{Character, RigSettings};
