use std::f64::consts::FRAC_PI_2;

use resvg::tiny_skia::Pixmap;

use crate::assets::catalog::TextureCatalog;
use crate::assets::manifest::{RigPart, Slot};
use crate::assets::texture::TextureAsset;
use crate::foundation::core::{Affine, Point, Rgba8, Vec2};
use crate::foundation::error::PuffsResult;
use crate::render::blur::{blur_pixmap, radius_for_sigma};
use crate::render::canvas::Canvas2D;
use crate::render::label::LabelRenderer;
use crate::render::outline::{OutlineSettings, Outliner};
use crate::rig::character::{Character, Direction};

/// Outline buffer size as a multiple of the body size.
pub const BUFFER_FACTOR: f64 = 5.0;
/// Largest outline buffer edge in pixels.
pub const MAX_BUFFER_PX: u32 = 4096;
/// Drop shadow blur, device pixels.
pub const SHADOW_SIGMA: f32 = 10.0;

const SHADOW_COLOR: Rgba8 = Rgba8::BLACK.with_alpha(160);

/// Pixels per local unit under `transform`.
pub fn device_scale(transform: Affine) -> f64 {
    transform.determinant().abs().sqrt()
}

#[derive(Debug)]
struct ShadowCache {
    size: (u32, u32),
    pixmap: Pixmap,
}

/// Draws a [`Character`] into a world-projected canvas.
///
/// Owns the per-frame outline scratch surface, the blurred shadow and the label cache.
#[derive(Debug, Default)]
pub struct RigRenderer {
    outliner: Outliner,
    labels: LabelRenderer,
    shadow: Option<ShadowCache>,
    seen: Option<[Option<u64>; 6]>,
    refreshes: u64,
}

impl RigRenderer {
    /// Renderer with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer whose labels use `labels` (e.g. one with preloaded fonts).
    pub fn with_labels(labels: LabelRenderer) -> Self {
        Self {
            labels,
            ..Self::default()
        }
    }

    /// Frames that drew a different set of part bitmaps than the frame before.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    fn note_generations(&mut self, layout: &Layout<'_>) {
        let stamp = layout.raster_generations();
        if self.seen == Some(stamp) {
            return;
        }
        if self.seen.is_some() {
            tracing::debug!(?stamp, "part bitmaps changed");
        }
        self.seen = Some(stamp);
        self.refreshes += 1;
    }

    /// Draw shadow, outlined silhouette and label at the character's position.
    ///
    /// Missing parts are skipped; the rest of the character still draws.
    pub fn draw(
        &mut self,
        canvas: &mut Canvas2D,
        character: &Character,
        catalog: &TextureCatalog,
        outline: &OutlineSettings,
    ) -> PuffsResult<()> {
        let rig = character.settings();
        let body = body_size(character, catalog);
        let logical = Vec2::new(rig.width / body.x, rig.height / body.y);
        let pop = character.pops().body;

        canvas.save();
        canvas.translate(character.position());
        canvas.scale(logical.x, logical.y);

        canvas.save();
        canvas.scale(pop, pop);
        self.draw_shadow(canvas, body)?;

        let buffer = body * BUFFER_FACTOR;
        let ppu = device_scale(canvas.transform());
        let px_w = buffer_px(buffer.x, ppu);
        let px_h = buffer_px(buffer.y, ppu);
        let unit = Vec2::new(f64::from(px_w) / buffer.x, f64::from(px_h) / buffer.y);
        let settings = outline.scaled(unit.x.min(unit.y));

        let layout = Layout::new(character, catalog, body);
        self.note_generations(&layout);
        let composed = self.outliner.process(px_w, px_h, &settings, |c| {
            c.scale(unit.x, unit.y);
            layout.draw_shape(c);
        })?;
        canvas.draw_image(
            composed,
            -buffer.x / 2.0,
            -buffer.y / 2.0,
            buffer.x,
            buffer.y,
        );
        canvas.restore();

        let label = character.label();
        let ppu = device_scale(canvas.transform());
        match self.labels.render(&label, ppu) {
            Ok(Some(img)) => {
                let baseline = img.height * 0.7;
                canvas.draw_image(
                    &img.pixmap,
                    -img.width / 2.0,
                    -body.y / 2.0 - baseline,
                    img.width,
                    img.height,
                );
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(%err, "name label skipped"),
        }

        canvas.restore();
        Ok(())
    }

    fn draw_shadow(&mut self, canvas: &mut Canvas2D, body: Vec2) -> PuffsResult<()> {
        let ppu = device_scale(canvas.transform());
        if !(ppu.is_finite() && ppu > 0.0) {
            return Ok(());
        }
        let radii = Vec2::new(body.x / 1.5, body.y / 6.0);
        let pad = radius_for_sigma(SHADOW_SIGMA);
        let size = (
            ((2.0 * radii.x * ppu).ceil() as u32 + 2 * pad).min(MAX_BUFFER_PX),
            ((2.0 * radii.y * ppu).ceil() as u32 + 2 * pad).min(MAX_BUFFER_PX),
        );

        let stale = self.shadow.as_ref().is_none_or(|s| s.size != size);
        if stale {
            let mut scratch = Canvas2D::new(size.0, size.1)?;
            scratch.fill_ellipse(
                Point::new(f64::from(size.0) / 2.0, f64::from(size.1) / 2.0),
                radii.x * ppu,
                radii.y * ppu,
                SHADOW_COLOR,
            );
            let pixmap = blur_pixmap(scratch.pixmap(), pad, SHADOW_SIGMA)?;
            self.shadow = Some(ShadowCache { size, pixmap });
        }

        if let Some(shadow) = &self.shadow {
            let w = f64::from(size.0) / ppu;
            let h = f64::from(size.1) / ppu;
            canvas.draw_image(&shadow.pixmap, -w / 2.0, body.y / 2.0 - h / 2.0, w, h);
        }
        Ok(())
    }
}

fn buffer_px(units: f64, ppu: f64) -> u32 {
    let px = (units * ppu).ceil();
    if px.is_finite() && px >= 1.0 {
        (px as u32).min(MAX_BUFFER_PX)
    } else {
        1
    }
}

fn body_size(character: &Character, catalog: &TextureCatalog) -> Vec2 {
    match catalog.part(RigPart::Body) {
        Some(body) if body.width() > 0.0 && body.height() > 0.0 => {
            Vec2::new(body.width(), body.height())
        }
        _ => Vec2::new(character.settings().width, character.settings().height),
    }
}

/// Draw an asset's raster centered on the local origin at its natural size.
fn blit(canvas: &mut Canvas2D, asset: Option<&TextureAsset>, offset: Vec2, y_scale: f64) {
    let Some(asset) = asset else {
        return;
    };
    let Some(image) = asset.image(false) else {
        return;
    };
    let (w, h) = (asset.width(), asset.height() * y_scale);
    canvas.draw_image(image.pixmap, offset.x - w / 2.0, offset.y - h / 2.0, w, h);
}

/// Everything the silhouette pass needs, resolved once per frame.
struct Layout<'a> {
    character: &'a Character,
    body: Vec2,
    body_asset: Option<&'a TextureAsset>,
    eyes: Option<&'a TextureAsset>,
    mouth: Option<&'a TextureAsset>,
    hand: Option<&'a TextureAsset>,
    headwear: Option<&'a TextureAsset>,
    weapon: Option<&'a TextureAsset>,
}

impl<'a> Layout<'a> {
    fn new(character: &'a Character, catalog: &'a TextureCatalog, body: Vec2) -> Self {
        let equipped = |slot| character.equipped(slot).and_then(|k| catalog.get(k));
        Self {
            character,
            body,
            body_asset: catalog.part(RigPart::Body),
            eyes: catalog.part(RigPart::Eyes),
            mouth: catalog.part(RigPart::Mouth),
            hand: catalog.part(RigPart::Hand),
            headwear: equipped(Slot::Headwear),
            weapon: equipped(Slot::Weapon),
        }
    }

    /// Raster generation of every part slot, `None` where nothing is drawn.
    fn raster_generations(&self) -> [Option<u64>; 6] {
        [
            self.body_asset,
            self.eyes,
            self.mouth,
            self.hand,
            self.headwear,
            self.weapon,
        ]
        .map(|a| a.map(TextureAsset::raster_generation))
    }

    /// Back to front: far hand, body, eyes, mouth, headwear, near hand.
    fn draw_shape(&self, canvas: &mut Canvas2D) {
        let facing = self.character.direction();
        self.draw_hand(canvas, facing.opposite());

        let wobble = self.character.wobble();
        let look = self.character.look_offset();
        canvas.save();
        canvas.scale(wobble.x, wobble.y);
        blit(canvas, self.body_asset, Vec2::ZERO, 1.0);
        blit(
            canvas,
            self.eyes,
            look + Vec2::new(0.0, -self.body.y / 4.0),
            self.character.eye_scale(),
        );
        blit(
            canvas,
            self.mouth,
            look + Vec2::new(0.0, self.body.x / 3.0),
            1.0,
        );
        canvas.restore();

        self.draw_headwear(canvas, facing);
        self.draw_hand(canvas, facing);
    }

    fn shoulder(&self, side: Direction) -> Vec2 {
        let x = self.body.y / 2.5;
        Vec2::new(
            if side == Direction::Left { x } else { -x },
            -self.body.y / 5.0,
        )
    }

    fn draw_hand(&self, canvas: &mut Canvas2D, side: Direction) {
        let holds_weapon = side != self.character.direction() && self.weapon.is_some();
        if holds_weapon {
            self.draw_weapon_hand(canvas, side);
            return;
        }

        let reach = self.body.y / 2.0;
        let angle = self.character.arm_angle(side) + FRAC_PI_2;
        canvas.save();
        canvas.translate(self.shoulder(side));
        canvas.translate(Vec2::from_angle(angle) * reach);
        blit(canvas, self.hand, Vec2::ZERO, 1.0);
        canvas.restore();
    }

    fn draw_weapon_hand(&self, canvas: &mut Canvas2D, side: Direction) {
        let Some(weapon) = self.weapon else {
            return;
        };
        let swing = self.character.weapon().swing_angle_deg().to_radians();
        let swing = if side == Direction::Left { swing } else { -swing };
        let aim = self.character.aim_angle();
        let reach = self.body.y / 2.0;
        let rig = self.character.settings();

        canvas.save();
        canvas.translate(self.shoulder(side));
        canvas.rotate(aim + swing);
        let thrust = self.character.jab_extension() * rig.jab_reach * self.body.y;
        if thrust > 0.0 {
            canvas.translate(Vec2::new(thrust, 0.0));
        }
        canvas.translate(Vec2::from_angle(aim - FRAC_PI_2) * reach);
        canvas.rotate(swing - FRAC_PI_2);

        canvas.save();
        if let Some(p) = weapon.meta().attachment.placement() {
            canvas.apply(p.to_affine());
        }
        let pop = self.character.pops().weapon;
        canvas.scale(pop, pop);
        blit(canvas, Some(weapon), Vec2::new(0.0, -weapon.height() / 4.0), 1.0);
        canvas.restore();

        let wobble = self.character.wobble();
        canvas.scale(wobble.x, wobble.y);
        blit(canvas, self.hand, Vec2::ZERO, 1.0);
        canvas.restore();
    }

    fn draw_headwear(&self, canvas: &mut Canvas2D, facing: Direction) {
        let Some(headwear) = self.headwear else {
            return;
        };
        let hand_w = self.hand.map_or(0.0, TextureAsset::width);
        canvas.save();
        canvas.scale(if facing == Direction::Right { -1.0 } else { 1.0 }, 1.0);
        canvas.translate(Vec2::new(-hand_w / 4.0, -self.body.y / 2.0));
        if let Some(p) = headwear.meta().attachment.placement() {
            canvas.apply(p.to_affine());
        }
        let pop = self.character.pops().headwear;
        canvas.scale(pop, pop);
        blit(canvas, Some(headwear), Vec2::ZERO, 1.0);
        canvas.restore();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/draw.rs"]
mod tests;
