use std::sync::Arc;

use anyhow::Context;
use resvg::tiny_skia::{IntSize, Pixmap};

use crate::assets::manifest::SourceKind;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{PuffsError, PuffsResult};
use crate::foundation::math::mul_div255_u8;

/// Element id whose fill follows the body recolor.
pub const COLORABLE_ID: &str = "colorable";

// Larger rasters indicate a broken source rather than a real sprite.
const MAX_DIM: u32 = 8_192;

/// Parse SVG bytes, optionally injecting a CSS style sheet.
pub fn parse_svg(bytes: &[u8], style_sheet: Option<&str>) -> PuffsResult<usvg::Tree> {
    parse_svg_with(bytes, style_sheet, None)
}

/// Parse SVG bytes with an explicit font database for `<text>` nodes.
pub fn parse_svg_with(
    bytes: &[u8],
    style_sheet: Option<&str>,
    fontdb: Option<Arc<usvg::fontdb::Database>>,
) -> PuffsResult<usvg::Tree> {
    let mut opts = usvg::Options {
        style_sheet: style_sheet.map(str::to_owned),
        ..Default::default()
    };
    if let Some(db) = fontdb {
        opts.fontdb = db;
    }
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

/// Style sheet overriding the fill of the `#colorable` element.
pub fn recolor_style_sheet(color: Rgba8) -> String {
    format!(
        "#{COLORABLE_ID} {{ fill: #{:02x}{:02x}{:02x}; fill-opacity: {:.4}; }}",
        color.r,
        color.g,
        color.b,
        f64::from(color.a) / 255.0
    )
}

/// Decode encoded image bytes into a premultiplied pixmap.
pub fn decode_bitmap(bytes: &[u8]) -> PuffsResult<Pixmap> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    check_dims(width, height)?;

    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    pixmap_from_premul(data, width, height)
}

/// Wrap premultiplied RGBA8 bytes in a pixmap.
pub fn pixmap_from_premul(data: Vec<u8>, width: u32, height: u32) -> PuffsResult<Pixmap> {
    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| PuffsError::render(format!("invalid pixmap size {width}x{height}")))?;
    Pixmap::from_vec(data, size)
        .ok_or_else(|| PuffsError::render("pixel buffer does not match pixmap size"))
}

/// Pixel size for a logical size at the given oversampling.
pub fn raster_size(width: f64, height: f64, resolution: f64) -> PuffsResult<(u32, u32)> {
    fn to_px(v: f64) -> PuffsResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(PuffsError::render("raster has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let w = to_px(width * resolution)?;
    let h = to_px(height * resolution)?;
    check_dims(w, h)?;
    Ok((w, h))
}

/// Render an SVG tree scaled to fill `width x height` pixels.
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> PuffsResult<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| PuffsError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Map an upload's MIME type to a source kind.
pub fn source_kind_for_mime(mime: &str) -> PuffsResult<SourceKind> {
    let mime = mime.trim().to_ascii_lowercase();
    if mime == "image/svg+xml" {
        return Ok(SourceKind::Vector);
    }
    if mime.starts_with("image/") {
        return Ok(SourceKind::Bitmap);
    }
    Err(PuffsError::invalid_upload(format!(
        "unsupported file type '{mime}', expected an image"
    )))
}

fn check_dims(w: u32, h: u32) -> PuffsResult<()> {
    if w == 0 || h == 0 || w > MAX_DIM || h > MAX_DIM {
        return Err(PuffsError::render(format!(
            "raster size out of range: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok(())
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
