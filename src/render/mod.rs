/// Procedural grid background and vignette.
pub mod background;
/// Gaussian blur.
pub mod blur;
/// 2D drawing surface.
pub mod canvas;
/// Name label text.
pub mod label;
/// Silhouette outline generator.
pub mod outline;
