use resvg::tiny_skia::{
    Color, GradientStop, Paint, Point as SkPoint, RadialGradient, Rect, SpreadMode, Transform,
};

use crate::foundation::core::{Point, Rgba8, Vec2};
use crate::render::canvas::Canvas2D;

/// Distance between grid lines in world units.
pub const GRID_SPACING: f64 = 25.0;
/// Grid tilt about the camera, in degrees.
pub const GRID_TILT_DEG: f64 = -5.0;
const MAJOR_EVERY: i64 = 5;
const MAJOR_ALPHA: f64 = 0.07;
const MINOR_ALPHA: f64 = 0.02;
const VIGNETTE_ALPHA: f32 = 0.5;

/// Stroke the world-anchored grid around `camera`, using the canvas' current projection.
pub fn draw_grid(canvas: &mut Canvas2D, camera: Vec2, viewport: Vec2) {
    let reach = viewport.hypot() / 2.0 + GRID_SPACING;

    canvas.save();
    canvas.translate(camera);
    canvas.rotate(GRID_TILT_DEG.to_radians());
    canvas.translate(-camera);

    let first_x = ((camera.x - reach) / GRID_SPACING).floor() as i64;
    let last_x = ((camera.x + reach) / GRID_SPACING).ceil() as i64;
    for k in first_x..=last_x {
        let x = k as f64 * GRID_SPACING;
        canvas.stroke_line(
            Point::new(x, camera.y - reach),
            Point::new(x, camera.y + reach),
            1.0,
            line_color(k),
        );
    }

    let first_y = ((camera.y - reach) / GRID_SPACING).floor() as i64;
    let last_y = ((camera.y + reach) / GRID_SPACING).ceil() as i64;
    for k in first_y..=last_y {
        let y = k as f64 * GRID_SPACING;
        canvas.stroke_line(
            Point::new(camera.x - reach, y),
            Point::new(camera.x + reach, y),
            1.0,
            line_color(k),
        );
    }

    canvas.restore();
}

fn line_color(k: i64) -> Rgba8 {
    let alpha = if k.rem_euclid(MAJOR_EVERY) == 0 {
        MAJOR_ALPHA
    } else {
        MINOR_ALPHA
    };
    Rgba8::WHITE.with_alpha((alpha * 255.0).round() as u8)
}

/// Darken the frame edges with a radial falloff in device space.
pub fn draw_vignette(canvas: &mut Canvas2D) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let center = SkPoint::from_xy(w / 2.0, h / 2.0);
    let radius = w.max(h) * 0.6;
    let inner = (w.min(h) * 0.2 / radius).clamp(0.0, 1.0);
    let stops = vec![
        GradientStop::new(inner, Color::TRANSPARENT),
        GradientStop::new(1.0, Color::from_rgba8(0, 0, 0, (VIGNETTE_ALPHA * 255.0) as u8)),
    ];
    let Some(shader) = RadialGradient::new(
        center,
        center,
        radius,
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    ) else {
        return;
    };
    let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) else {
        return;
    };
    let paint = Paint {
        shader,
        anti_alias: false,
        ..Paint::default()
    };
    canvas
        .pixmap_mut()
        .fill_rect(rect, &paint, Transform::identity(), None);
}
