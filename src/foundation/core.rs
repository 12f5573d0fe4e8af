pub use kurbo::{Affine, Point, Vec2};

/// Axis-aligned box anchored at its center.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rectangle2D {
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Full width.
    pub w: f64,
    /// Full height.
    pub h: f64,
}

impl Rectangle2D {
    /// Build a center-anchored rectangle.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Center point as a vector.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Move the center to `p`.
    pub fn set_center(&mut self, p: Vec2) {
        self.x = p.x;
        self.y = p.y;
    }

    /// Half width and half height.
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.w / 2.0, self.h / 2.0)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Vec2) -> bool {
        let half = self.half_extents();
        (p.x - self.x).abs() <= half.x && (p.y - self.y).abs() <= half.y
    }

    /// Convert to a min/max `kurbo::Rect`.
    pub fn to_rect(&self) -> kurbo::Rect {
        let half = self.half_extents();
        kurbo::Rect::new(
            self.x - half.x,
            self.y - half.y,
            self.x + half.x,
            self.y + half.y,
        )
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Build a color from straight channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Convert to the rasterizer's color type.
    pub fn to_skia(self) -> resvg::tiny_skia::Color {
        resvg::tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// Lowercase `#rrggbb` (alpha appended only when not opaque).
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Placement of an attachment relative to its anchor on the rig.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Horizontal offset from the anchor.
    #[serde(default)]
    pub x: f64,
    /// Vertical offset from the anchor.
    #[serde(default)]
    pub y: f64,
    /// Horizontal scale.
    #[serde(default = "one")]
    pub scale_x: f64,
    /// Vertical scale.
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Rotation in radians.
    #[serde(default)]
    pub rotation: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

impl Placement {
    /// `T(x, y) * R(rotation) * S(scale_x, scale_y)`
    pub fn to_affine(self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y))
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.scale_x, self.scale_y, self.rotation]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Guard a frame delta: NaN, infinite and negative deltas become 0, large ones are clamped.
pub fn clamp_delta_secs(dt: f64, max_secs: f64) -> f64 {
    if !dt.is_finite() || dt <= 0.0 {
        return 0.0;
    }
    dt.min(max_secs.max(0.0))
}
