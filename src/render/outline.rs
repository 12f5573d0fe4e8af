use std::f64::consts::TAU;

use resvg::tiny_skia::{BlendMode, Pixmap};

use crate::foundation::core::{Rgba8, Vec2};
use crate::foundation::error::{PuffsError, PuffsResult};
use crate::render::canvas::Canvas2D;

/// Thinnest stroke that is still drawn; anything below returns the bare shape.
pub const MIN_VISIBLE_THICKNESS: f64 = 0.1;

/// Arc length, in pixels, covered by one stamp on the dilation ring.
pub const SAMPLE_SPACING: f64 = 10.0;

/// Thickest outline accepted from settings, in logical units.
pub const MAX_THICKNESS: f64 = 100.0;

/// Thickest ring the outliner will stamp, in pixels.
pub const MAX_RING_PX: f64 = 1024.0;

const MIN_SAMPLES: usize = 8;

/// Global outline appearance, passed explicitly to every outline run.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    /// Stroke color.
    pub color: Rgba8,
    /// Stroke width in output pixels.
    pub thickness: f64,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            color: Rgba8::WHITE,
            thickness: 3.0,
        }
    }
}

impl OutlineSettings {
    /// Whether a ring is drawn at all.
    pub fn is_visible(&self) -> bool {
        self.thickness >= MIN_VISIBLE_THICKNESS
    }

    /// Reject a thickness that is negative, non-finite or above [`MAX_THICKNESS`].
    pub fn validate(&self) -> PuffsResult<()> {
        if !(self.thickness.is_finite() && (0.0..=MAX_THICKNESS).contains(&self.thickness)) {
            return Err(PuffsError::validation(format!(
                "outline thickness must be in [0, {MAX_THICKNESS}], got {}",
                self.thickness
            )));
        }
        Ok(())
    }

    /// Pixels of padding on each side needed to hold the ring.
    pub fn ring_padding(&self) -> PuffsResult<u32> {
        if !self.is_visible() {
            return Ok(0);
        }
        if !(self.thickness.is_finite() && self.thickness <= MAX_RING_PX) {
            return Err(PuffsError::render(format!(
                "outline ring of {} px exceeds {MAX_RING_PX} px",
                self.thickness
            )));
        }
        Ok(self.thickness.ceil() as u32)
    }

    /// Same color, thickness multiplied by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            thickness: self.thickness * factor,
            ..self
        }
    }
}

/// Number of ring stamps for `thickness`: grows with the circumference, never below 8.
pub fn sample_count(thickness: f64) -> usize {
    if !thickness.is_finite() || thickness <= 0.0 {
        return MIN_SAMPLES;
    }
    let n = (TAU * thickness / SAMPLE_SPACING).ceil();
    MIN_SAMPLES.max(n as usize)
}

/// Evenly spaced offsets of length `thickness`.
pub fn ring_offsets(thickness: f64) -> Vec<Vec2> {
    let n = sample_count(thickness);
    (0..n)
        .map(|i| Vec2::from_angle(TAU * i as f64 / n as f64) * thickness)
        .collect()
}

/// Silhouette stroker with reusable scratch buffers.
///
/// The returned pixmap borrows the scratch surface: copy or draw it before calling
/// [`Outliner::process`] again.
#[derive(Debug, Default)]
pub struct Outliner {
    surface: Option<Canvas2D>,
    base: Option<Pixmap>,
}

impl Outliner {
    /// Empty outliner; buffers are allocated on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a shape centered at the local origin and stroke its silhouette.
    ///
    /// `draw` runs once with the surface origin at the center of a `width x height` surface.
    pub fn process<F>(
        &mut self,
        width: u32,
        height: u32,
        settings: &OutlineSettings,
        draw: F,
    ) -> PuffsResult<&Pixmap>
    where
        F: FnOnce(&mut Canvas2D),
    {
        settings.ring_padding()?;
        let reuse = matches!(
            &self.surface,
            Some(s) if s.width() == width && s.height() == height
        );
        if !reuse {
            self.surface = Some(Canvas2D::new(width, height)?);
            self.base = None;
        }
        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| PuffsError::render("outline surface missing"))?;

        surface.clear();
        surface.translate(Vec2::new(f64::from(width) / 2.0, f64::from(height) / 2.0));
        draw(surface);
        surface.reset_transform();

        if !settings.is_visible() {
            return Ok(surface.pixmap());
        }

        let base: &Pixmap = match &mut self.base {
            Some(b) => {
                b.data_mut().copy_from_slice(surface.pixmap().data());
                b
            }
            slot => slot.insert(surface.pixmap().clone()),
        };

        for offset in ring_offsets(settings.thickness) {
            surface.composite(base, offset, BlendMode::DestinationOver);
        }
        surface.fill_blended(settings.color, BlendMode::SourceIn);
        surface.composite(base, Vec2::ZERO, BlendMode::SourceOver);

        Ok(surface.pixmap())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/outline.rs"]
mod tests;
