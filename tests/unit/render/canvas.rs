use super::*;

fn solid(w: u32, h: u32, color: Rgba8) -> Pixmap {
    let mut p = Pixmap::new(w, h).unwrap();
    p.fill(color.to_skia());
    p
}

#[test]
fn save_restore_round_trips_transform() {
    let mut c = Canvas2D::new(4, 4).unwrap();
    c.save();
    c.translate(Vec2::new(3.0, 1.0));
    c.scale(2.0, 2.0);
    assert_ne!(c.transform(), Affine::IDENTITY);
    c.restore();
    assert_eq!(c.transform(), Affine::IDENTITY);

    // Unbalanced restore keeps the current transform.
    c.translate(Vec2::new(1.0, 0.0));
    c.restore();
    assert_eq!(c.transform(), Affine::translate(Vec2::new(1.0, 0.0)));
}

#[test]
fn draw_image_respects_translation() {
    let mut c = Canvas2D::new(8, 8).unwrap();
    let red = solid(2, 2, Rgba8::new(255, 0, 0, 255));
    c.translate(Vec2::new(4.0, 4.0));
    c.draw_image(&red, 0.0, 0.0, 2.0, 2.0);

    assert_eq!(c.pixmap().pixel(4, 4).unwrap().alpha(), 255);
    assert_eq!(c.pixmap().pixel(0, 0).unwrap().alpha(), 0);
}

#[test]
fn draw_image_skips_degenerate_size() {
    let mut c = Canvas2D::new(4, 4).unwrap();
    let red = solid(2, 2, Rgba8::new(255, 0, 0, 255));
    c.draw_image(&red, 0.0, 0.0, 0.0, 2.0);
    c.draw_image(&red, 0.0, 0.0, f64::NAN, 2.0);
    assert!(c.pixmap().data().iter().all(|&b| b == 0));
}

#[test]
fn source_in_fill_keeps_only_covered_pixels() {
    let mut c = Canvas2D::new(4, 1).unwrap();
    let dot = solid(1, 1, Rgba8::new(255, 0, 0, 255));
    c.composite(&dot, Vec2::new(1.0, 0.0), BlendMode::SourceOver);
    c.fill_blended(Rgba8::new(0, 255, 0, 255), BlendMode::SourceIn);

    let px = c.pixmap().pixel(1, 0).unwrap();
    assert_eq!((px.red(), px.green(), px.alpha()), (0, 255, 255));
    assert_eq!(c.pixmap().pixel(0, 0).unwrap().alpha(), 0);
    assert_eq!(c.pixmap().pixel(3, 0).unwrap().alpha(), 0);
}

#[test]
fn resize_reallocates_and_clears() {
    let mut c = Canvas2D::new(2, 2).unwrap();
    c.fill(Rgba8::WHITE);
    c.resize(3, 5).unwrap();
    assert_eq!((c.width(), c.height()), (3, 5));
    assert!(c.pixmap().data().iter().all(|&b| b == 0));
}

#[test]
fn to_skia_maps_translation() {
    let t = to_skia(Affine::translate(Vec2::new(5.0, -2.0)));
    assert_eq!((t.tx, t.ty), (5.0, -2.0));
    assert_eq!((t.sx, t.sy), (1.0, 1.0));
}
