use resvg::tiny_skia::{
    BlendMode, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

use crate::foundation::core::{Affine, Point, Rgba8, Vec2};
use crate::foundation::error::{PuffsError, PuffsResult};

/// 2D drawing surface: a premultiplied pixmap plus a current transform with a save/restore stack.
pub struct Canvas2D {
    pixmap: Pixmap,
    transform: Affine,
    stack: Vec<Affine>,
}

impl std::fmt::Debug for Canvas2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas2D")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("transform", &self.transform)
            .field("depth", &self.stack.len())
            .finish()
    }
}

impl Canvas2D {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> PuffsResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            PuffsError::render(format!("failed to allocate {width}x{height} surface"))
        })?;
        Ok(Self {
            pixmap,
            transform: Affine::IDENTITY,
            stack: Vec::new(),
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Reallocate when the size changes, then clear.
    pub fn resize(&mut self, width: u32, height: u32) -> PuffsResult<()> {
        if self.width() != width || self.height() != height {
            *self = Self::new(width, height)?;
        }
        self.clear();
        Ok(())
    }

    /// Clear to transparent and reset the transform stack.
    pub fn clear(&mut self) {
        self.pixmap.fill(resvg::tiny_skia::Color::TRANSPARENT);
        self.reset_transform();
    }

    /// Fill the whole surface with `color`, ignoring the transform.
    pub fn fill(&mut self, color: Rgba8) {
        self.pixmap.fill(color.to_skia());
    }

    /// Fill the whole surface using `blend`, ignoring the transform.
    pub fn fill_blended(&mut self, color: Rgba8, blend: BlendMode) {
        let Some(rect) = Rect::from_xywh(0.0, 0.0, self.width() as f32, self.height() as f32)
        else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.blend_mode = blend;
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Push the current transform.
    pub fn save(&mut self) {
        self.stack.push(self.transform);
    }

    /// Pop the last saved transform; unbalanced calls are ignored.
    pub fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    /// Drop saved transforms and return to identity, keeping pixels.
    pub fn reset_transform(&mut self) {
        self.transform = Affine::IDENTITY;
        self.stack.clear();
    }

    /// Current transform.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Post-multiply a translation.
    pub fn translate(&mut self, v: Vec2) {
        self.transform *= Affine::translate(v);
    }

    /// Post-multiply a rotation (radians).
    pub fn rotate(&mut self, radians: f64) {
        self.transform *= Affine::rotate(radians);
    }

    /// Post-multiply a scale.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.transform *= Affine::scale_non_uniform(sx, sy);
    }

    /// Post-multiply an arbitrary affine.
    pub fn apply(&mut self, affine: Affine) {
        self.transform *= affine;
    }

    /// Draw `image` stretched into the local rectangle `(x, y, w, h)`.
    pub fn draw_image(&mut self, image: &Pixmap, x: f64, y: f64, w: f64, h: f64) {
        if !(w.is_finite() && h.is_finite()) || w == 0.0 || h == 0.0 {
            return;
        }
        let local = Affine::translate(Vec2::new(x, y))
            * Affine::scale_non_uniform(
                w / f64::from(image.width()),
                h / f64::from(image.height()),
            );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            to_skia(self.transform * local),
            None,
        );
    }

    /// Draw `image` centered on the local origin at size `w x h`.
    pub fn draw_image_centered(&mut self, image: &Pixmap, w: f64, h: f64) {
        self.draw_image(image, -w / 2.0, -h / 2.0, w, h);
    }

    /// Composite `image` in device space at `offset` using `blend`, ignoring the transform.
    pub fn composite(&mut self, image: &Pixmap, offset: Vec2, blend: BlendMode) {
        let paint = PixmapPaint {
            blend_mode: blend,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            Transform::from_translate(offset.x as f32, offset.y as f32),
            None,
        );
    }

    /// Fill an axis-aligned ellipse in local space.
    pub fn fill_ellipse(&mut self, center: Point, rx: f64, ry: f64, color: Rgba8) {
        let Some(rect) = Rect::from_xywh(
            (center.x - rx) as f32,
            (center.y - ry) as f32,
            (2.0 * rx) as f32,
            (2.0 * ry) as f32,
        ) else {
            return;
        };
        let Some(path) = PathBuilder::from_oval(rect) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = true;
        self.pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            to_skia(self.transform),
            None,
        );
    }

    /// Stroke a straight segment in local space.
    pub fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba8) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let Some(path) = pb.finish() else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = true;
        let stroke = Stroke {
            width: width as f32,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, to_skia(self.transform), None);
    }

    /// Read-only pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Mutable pixels for direct tiny-skia drawing.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }
}

/// Convert a kurbo affine into a tiny-skia transform.
pub fn to_skia(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
