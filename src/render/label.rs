use std::sync::Arc;

use resvg::tiny_skia::Pixmap;

use crate::assets::decode::{parse_svg_with, raster_size, rasterize_svg};
use crate::foundation::error::PuffsResult;

/// Label font size in world units.
pub const FONT_SIZE: f64 = 14.0;
const ELLIPSIS: char = '…';

/// Shorten `name` to at most `max_chars` scalar values, ending in an ellipsis when cut.
pub fn truncate_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_owned();
    }
    let mut out: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

/// Rendered label bitmap with its logical size.
#[derive(Clone, Debug)]
pub struct LabelImage {
    /// Oversampled pixels.
    pub pixmap: Pixmap,
    /// Logical width.
    pub width: f64,
    /// Logical height.
    pub height: f64,
}

/// Renders the stroked name label through usvg text, caching the last result.
#[derive(Default)]
pub struct LabelRenderer {
    fontdb: Option<Arc<usvg::fontdb::Database>>,
    cached: Option<(String, f64, LabelImage)>,
}

impl std::fmt::Debug for LabelRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelRenderer")
            .field("fonts_loaded", &self.fontdb.is_some())
            .field("cached", &self.cached.as_ref().map(|(t, s, _)| (t, s)))
            .finish()
    }
}

impl LabelRenderer {
    /// Renderer that loads system fonts on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with a caller-provided font database.
    pub fn with_fonts(fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self {
            fontdb: Some(fontdb),
            cached: None,
        }
    }

    /// Label image for `text` at `scale` pixels per unit; `None` for empty text.
    pub fn render(&mut self, text: &str, scale: f64) -> PuffsResult<Option<&LabelImage>> {
        if text.is_empty() {
            return Ok(None);
        }
        let hit = matches!(&self.cached, Some((t, s, _)) if t == text && *s == scale);
        if !hit {
            let fontdb = self.fontdb.get_or_insert_with(load_system_fonts).clone();
            let image = render_label(text, scale, fontdb)?;
            self.cached = Some((text.to_owned(), scale, image));
        }
        Ok(self.cached.as_ref().map(|(_, _, img)| img))
    }
}

fn load_system_fonts() -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts for labels");
    Arc::new(db)
}

fn render_label(
    text: &str,
    scale: f64,
    fontdb: Arc<usvg::fontdb::Database>,
) -> PuffsResult<LabelImage> {
    let width = (text.chars().count() as f64 * FONT_SIZE * 0.7 + FONT_SIZE).ceil();
    let height = (FONT_SIZE * 1.8).ceil();
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"><text x="{cx}" y="{baseline}" font-family="sans-serif" font-size="{FONT_SIZE}" text-anchor="middle" fill="white" stroke="black" stroke-width="2" paint-order="stroke">{body}</text></svg>"#,
        cx = width / 2.0,
        baseline = height * 0.7,
        body = escape_xml(text),
    );

    let tree = parse_svg_with(svg.as_bytes(), None, Some(fontdb))?;
    let (pw, ph) = raster_size(width, height, scale)?;
    let pixmap = rasterize_svg(&tree, pw, ph)?;
    Ok(LabelImage {
        pixmap,
        width,
        height,
    })
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
