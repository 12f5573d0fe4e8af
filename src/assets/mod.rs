/// Texture catalog and its task queue.
pub mod catalog;
/// Hex and HSL colors.
pub mod color;
/// SVG and bitmap decoding, recolor and rasterization.
pub mod decode;
/// Asset manifest parsing and validation.
pub mod manifest;
/// Texture asset with coalesced rasterize/outline.
pub mod texture;
