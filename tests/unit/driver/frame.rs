use super::*;
use crate::assets::manifest::{AssetMeta, BehaviorTag, RigPart, SourceKind};
use crate::assets::texture::TextureAsset;
use crate::driver::settings::Viewport;
use crate::foundation::core::Rgba8;
use crate::render::outline::MAX_THICKNESS;
use crate::rig::weapon::WeaponBehavior;

fn svg(w: u32, h: u32, fill: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}"><rect width="{w}" height="{h}" fill="{fill}"/></svg>"#
    )
}

fn add(catalog: &mut TextureCatalog, key: &str, src: &str, meta: AssetMeta) {
    let asset = TextureAsset::load(key, SourceKind::Vector, src.as_bytes(), meta).unwrap();
    catalog.insert(asset).unwrap();
}

fn meta(attachment: Attachment, slot: Option<Slot>, part: Option<RigPart>) -> AssetMeta {
    AssetMeta {
        name: "asset".to_owned(),
        attachment,
        slot,
        part,
        outline: false,
        colorable: part == Some(RigPart::Body),
        resolution: 1.0,
    }
}

fn catalog() -> TextureCatalog {
    let mut c = TextureCatalog::new();
    add(&mut c, "body.svg", &svg(10, 10, "#ff0000"), meta(Attachment::None, None, Some(RigPart::Body)));
    add(&mut c, "eyes.svg", &svg(2, 2, "#000000"), meta(Attachment::None, None, Some(RigPart::Eyes)));
    add(&mut c, "mouth.svg", &svg(2, 2, "#000000"), meta(Attachment::None, None, Some(RigPart::Mouth)));
    add(&mut c, "hand.svg", &svg(3, 3, "#00ff00"), meta(Attachment::None, None, Some(RigPart::Hand)));
    add(&mut c, "no-hat.svg", &svg(1, 1, "none"), meta(Attachment::None, Some(Slot::Headwear), None));
    add(
        &mut c,
        "hat.svg",
        &svg(4, 4, "#0000ff"),
        meta(Attachment::Headwear { placement: Placement::default() }, Some(Slot::Headwear), None),
    );
    add(
        &mut c,
        "sword.svg",
        &svg(2, 8, "#888888"),
        meta(
            Attachment::Weapon { behavior: BehaviorTag::Swing, placement: Placement::default() },
            Some(Slot::Weapon),
            None,
        ),
    );
    add(
        &mut c,
        "spear.svg",
        &svg(1, 12, "#888888"),
        meta(
            Attachment::Weapon { behavior: BehaviorTag::Jab, placement: Placement::default() },
            Some(Slot::Weapon),
            None,
        ),
    );
    add(
        &mut c,
        "upload-hat.svg",
        &svg(1, 1, "none"),
        meta(Attachment::Upload { slot: Slot::Headwear }, Some(Slot::Headwear), None),
    );
    c.pump_until_idle();
    c
}

fn driver() -> FrameDriver {
    let settings = Settings {
        viewport: Viewport {
            width: 160,
            height: 120,
        },
        ..Settings::default()
    };
    FrameDriver::new(settings, catalog()).unwrap()
}

fn key_down(code: &str) -> InputEvent {
    InputEvent::KeyDown {
        code: code.to_owned(),
        repeat: false,
    }
}

#[test]
fn first_tick_only_records_the_clock_and_large_gaps_are_clamped() {
    let mut d = driver();
    d.handle_event(key_down("ArrowRight")).unwrap();
    d.tick(100.0);
    assert_eq!(d.character().position(), Vec2::ZERO);

    // A 10 s gap integrates as 50 ms: v = 3600 * 0.05 * (1 - 10 * 0.05) = 90, x = 90 * 0.05.
    d.tick(110.0);
    assert!((d.character().position().x - 4.5).abs() < 1e-9);
    assert_eq!(d.stats().ticks, 2);
}

#[test]
fn non_finite_timestamps_do_not_move_anything() {
    let mut d = driver();
    d.handle_event(key_down("KeyD")).unwrap();
    d.tick(1.0);
    d.tick(f64::NAN);
    d.tick(f64::INFINITY);
    assert_eq!(d.character().position(), Vec2::ZERO);
}

#[test]
fn blur_releases_keys() {
    let mut d = driver();
    d.handle_event(key_down("KeyS")).unwrap();
    d.handle_event(InputEvent::Blur).unwrap();
    for _ in 0..5 {
        d.step(0.016);
    }
    assert_eq!(d.character().position(), Vec2::ZERO);
}

#[test]
fn click_swings_weapon_and_shakes_camera() {
    let mut d = driver();
    d.handle_event(InputEvent::Equip {
        slot: Slot::Weapon,
        key: Some("sword.svg".to_owned()),
    })
    .unwrap();
    d.handle_event(InputEvent::Click).unwrap();
    assert_eq!(d.camera().shake_magnitude(), 5.0);
    d.step(0.016);
    assert!((d.camera().shake_magnitude() - 4.0).abs() < 1e-12);
    assert!(d.character().weapon().swing_angle_deg() > 0.0);
}

#[test]
fn click_without_weapon_still_shakes() {
    let mut d = driver();
    d.click();
    assert_eq!(*d.character().weapon(), WeaponBehavior::None);
    assert_eq!(d.camera().shake_magnitude(), 5.0);
}

#[test]
fn focus_snaps_camera_to_character() {
    let mut d = driver();
    d.handle_event(key_down("ArrowDown")).unwrap();
    for _ in 0..30 {
        d.step(0.016);
    }
    let pos = d.character().position();
    assert!(d.camera().current() != pos);
    d.handle_event(InputEvent::Focus).unwrap();
    assert_eq!(d.camera().current(), pos);
    assert_eq!(d.camera().target(), pos);
}

#[test]
fn equip_rejects_unknown_mismatched_and_placeholder_keys() {
    let mut d = driver();
    assert!(d.equip(Slot::Headwear, Some("missing.svg")).is_err());
    assert!(d.equip(Slot::Headwear, Some("sword.svg")).is_err());
    assert!(d.equip(Slot::Headwear, Some("upload-hat.svg")).is_err());
    assert_eq!(d.character().equipped(Slot::Headwear), None);

    d.equip(Slot::Weapon, Some("spear.svg")).unwrap();
    assert_eq!(d.character().weapon().tag(), Some(BehaviorTag::Jab));
    d.equip(Slot::Weapon, None).unwrap();
    assert_eq!(*d.character().weapon(), WeaponBehavior::None);
}

#[test]
fn invalid_upload_is_surfaced_and_ignored() {
    let mut d = driver();
    let before = d.catalog().len();
    let err = d
        .handle_event(InputEvent::Upload {
            slot: Slot::Headwear,
            file_name: "notes.txt".to_owned(),
            mime: "text/plain".to_owned(),
            bytes: b"hello".as_slice().into(),
        })
        .unwrap_err();
    assert!(matches!(err, PuffsError::InvalidUpload(_)));
    assert_eq!(d.catalog().len(), before);
    assert_eq!(d.character().equipped(Slot::Headwear), None);
}

#[test]
fn upload_equips_new_weapon_with_swing() {
    let mut d = driver();
    let key = d
        .upload(Slot::Weapon, "club.svg", "image/svg+xml", svg(3, 9, "#654321").as_bytes())
        .unwrap();
    assert_eq!(key, "upload/1/club.svg");
    assert_eq!(d.character().equipped(Slot::Weapon), Some(key.as_str()));
    assert_eq!(d.character().weapon().tag(), Some(BehaviorTag::Swing));

    let moved = Placement {
        x: 2.0,
        ..Placement::default()
    };
    d.handle_event(InputEvent::SetPlacement {
        key: key.clone(),
        placement: moved,
    })
    .unwrap();
    assert_eq!(
        d.catalog().get(&key).unwrap().meta().attachment.placement(),
        Some(moved)
    );
}

#[test]
fn bad_outline_color_leaves_settings_untouched() {
    let mut d = driver();
    let before = d.catalog().outline_settings();
    assert!(d.handle_event(InputEvent::OutlineColor("red".to_owned())).is_err());
    assert!(d.handle_event(InputEvent::OutlineThickness(f64::NAN)).is_err());
    assert_eq!(d.catalog().outline_settings(), before);

    d.handle_event(InputEvent::OutlineColor("#00FF00".to_owned())).unwrap();
    d.handle_event(InputEvent::OutlineThickness(5.0)).unwrap();
    let after = d.catalog().outline_settings();
    assert_eq!(after.color, Rgba8::new(0, 255, 0, 255));
    assert_eq!(after.thickness, 5.0);
}

#[test]
fn oversized_outline_thickness_is_rejected() {
    let mut d = driver();
    let before = d.catalog().outline_settings();
    assert!(matches!(
        d.handle_event(InputEvent::OutlineThickness(1e9)),
        Err(PuffsError::Validation(_))
    ));
    assert!(d.set_outline_thickness(MAX_THICKNESS + 1.0).is_err());
    assert_eq!(d.catalog().outline_settings(), before);

    d.set_outline_thickness(MAX_THICKNESS).unwrap();
    d.step(0.016);
    assert_eq!(d.stats().frames_rendered, 1);
}

#[test]
fn failed_render_is_skipped_while_simulation_runs() {
    let mut d = driver();
    // The catalog setter does no validation; the outliner refuses the ring.
    d.catalog_mut().set_outline_settings(OutlineSettings {
        thickness: 1e9,
        ..OutlineSettings::default()
    });
    d.handle_event(key_down("ArrowRight")).unwrap();
    for _ in 0..3 {
        d.step(0.016);
    }
    let stats = d.stats();
    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.frames_skipped, 3);
    assert_eq!(stats.frames_rendered, 0);
    assert!(d.character().position().x > 0.0);

    d.catalog_mut().set_outline_settings(OutlineSettings::default());
    d.step(0.016);
    assert_eq!(d.stats().frames_rendered, 1);
    assert_eq!(d.stats().frames_skipped, 3);
}

#[test]
fn randomize_equips_from_slots_and_recolors_body() {
    let mut d = driver();
    d.handle_event(InputEvent::Randomize).unwrap();
    let hat = d.character().equipped(Slot::Headwear).unwrap();
    assert!(["no-hat.svg", "hat.svg"].contains(&hat));
    let weapon = d.character().equipped(Slot::Weapon).unwrap();
    assert!(["sword.svg", "spear.svg"].contains(&weapon));

    let color = d.catalog().body_color().unwrap();
    // Lightness >= 0.6 keeps every channel well above black.
    assert!(color.r.min(color.g).min(color.b) >= 50);
}

#[test]
fn frame_shows_body_at_viewport_center() {
    let mut d = driver();
    d.step(0.016);
    assert_eq!(d.stats().frames_rendered, 1);
    let px = d.frame().pixel(80, 60).unwrap();
    assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 0, 0, 255));
    assert_eq!(d.world_cursor(), d.character().position());
}

#[test]
fn resize_changes_frame_and_camera_viewport() {
    let mut d = driver();
    d.resize(64, 32).unwrap();
    d.step(0.016);
    assert_eq!((d.frame().width(), d.frame().height()), (64, 32));
    assert_eq!(d.camera().viewport(), Vec2::new(64.0, 32.0));
    assert_eq!(d.settings().viewport.size(), Vec2::new(64.0, 32.0));
    let px = d.frame().pixel(32, 16).unwrap();
    assert_eq!((px.red(), px.green(), px.blue()), (255, 0, 0));

    assert!(d.resize(0, 10).is_err());
}
