use super::*;
use crate::foundation::core::Point;

fn dot(canvas: &mut Canvas2D) {
    canvas.fill_ellipse(Point::ORIGIN, 4.0, 4.0, Rgba8::new(255, 0, 0, 255));
}

fn settings(thickness: f64) -> OutlineSettings {
    OutlineSettings {
        color: Rgba8::new(0, 0, 255, 255),
        thickness,
    }
}

#[test]
fn sample_count_is_monotonic_and_at_least_eight() {
    let mut prev = 0;
    for i in 0..400 {
        let t = f64::from(i) * 0.25;
        let n = sample_count(t);
        assert!(n >= 8, "thickness {t} gave {n}");
        assert!(n >= prev, "thickness {t} decreased from {prev} to {n}");
        prev = n;
    }
    assert_eq!(sample_count(f64::NAN), 8);
    assert!(sample_count(100.0) > 8);
}

#[test]
fn ring_offsets_have_requested_length() {
    for v in ring_offsets(6.0) {
        assert!((v.hypot() - 6.0).abs() < 1e-9);
    }
}

#[test]
fn output_matches_requested_size() {
    let mut o = Outliner::new();
    let out = o.process(31, 17, &settings(3.0), dot).unwrap();
    assert_eq!((out.width(), out.height()), (31, 17));

    let out = o.process(8, 40, &settings(3.0), dot).unwrap();
    assert_eq!((out.width(), out.height()), (8, 40));
}

#[test]
fn thin_outline_returns_base_shape() {
    let mut o = Outliner::new();
    let outlined = o.process(32, 32, &settings(0.05), dot).unwrap().clone();

    let mut bare = Canvas2D::new(32, 32).unwrap();
    bare.translate(Vec2::new(16.0, 16.0));
    dot(&mut bare);

    assert_eq!(outlined.data(), bare.pixmap().data());
}

#[test]
fn repeated_runs_are_pixel_identical() {
    let mut o = Outliner::new();
    let first = o.process(32, 32, &settings(3.0), dot).unwrap().clone();
    let second = o.process(32, 32, &settings(3.0), dot).unwrap().clone();
    assert_eq!(first.data(), second.data());
}

#[test]
fn ring_surrounds_untouched_shape() {
    let mut o = Outliner::new();
    let out = o.process(32, 32, &settings(3.0), dot).unwrap();

    // Shape center keeps its own color.
    let center = out.pixel(16, 16).unwrap();
    assert_eq!((center.red(), center.blue(), center.alpha()), (255, 0, 255));

    // Just outside the radius-4 dot sits the outline color.
    let ring = out.pixel(16 + 5, 16).unwrap();
    assert_eq!((ring.red(), ring.blue(), ring.alpha()), (0, 255, 255));

    // Far away stays transparent.
    assert_eq!(out.pixel(0, 0).unwrap().alpha(), 0);
}

#[test]
fn settings_visibility_threshold() {
    assert!(!settings(0.0).is_visible());
    assert!(!settings(f64::NAN).is_visible());
    assert!(settings(MIN_VISIBLE_THICKNESS).is_visible());
    assert_eq!(settings(2.0).scaled(4.0).thickness, 8.0);
}

#[test]
fn thickness_limits_are_enforced() {
    assert!(settings(MAX_THICKNESS).validate().is_ok());
    assert!(settings(0.0).validate().is_ok());
    for bad in [MAX_THICKNESS + 0.5, -1.0, f64::NAN, f64::INFINITY, 1e9] {
        assert!(
            matches!(settings(bad).validate(), Err(PuffsError::Validation(_))),
            "accepted {bad}"
        );
    }

    assert_eq!(settings(0.05).ring_padding().unwrap(), 0);
    assert_eq!(settings(2.5).ring_padding().unwrap(), 3);
    assert!(settings(MAX_RING_PX * 2.0).ring_padding().is_err());
}

#[test]
fn oversized_ring_is_an_error_not_a_panic() {
    let mut o = Outliner::new();
    let err = o.process(16, 16, &settings(1e9), dot).unwrap_err();
    assert!(matches!(err, PuffsError::Render(_)));
    // The scratch surface is still usable afterwards.
    assert!(o.process(16, 16, &settings(2.0), dot).is_ok());
}
