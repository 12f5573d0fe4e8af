use std::io::Cursor;
use std::path::PathBuf;

use super::*;

const SHAPE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
  <rect id="colorable" width="10" height="10" fill="#ff0000"/>
</svg>"##;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "puffs_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn fixture(name: &str, extra: &str) -> PathBuf {
    let dir = temp_dir(name);
    std::fs::create_dir_all(&dir).unwrap();
    for f in ["body.svg", "eyes.svg", "mouth.svg", "hand.svg", "hat.svg", "sword.svg"] {
        std::fs::write(dir.join(f), SHAPE).unwrap();
    }
    let manifest = format!(
        r#"[
        {{"name": "Body", "path": "body.svg", "part": "body", "colorable": true}},
        {{"name": "Eyes", "path": "eyes.svg", "part": "eyes"}},
        {{"name": "Mouth", "path": "mouth.svg", "part": "mouth"}},
        {{"name": "Hand", "path": "hand.svg", "part": "hand", "colorable": true}},
        {{"name": "No hat", "path": "eyes.svg", "slot": "headwear"}},
        {{"name": "Hat", "path": "hat.svg", "outline": true, "attachment": "headwear", "transform": {{}}}},
        {{"name": "Sword", "path": "sword.svg", "outline": true, "attachment": "weapon", "behavior": "swing", "transform": {{}}}}
        {extra}
    ]"#
    );
    std::fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
    dir
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_raw(2, 3, vec![255u8; 2 * 3 * 4]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn duplicate_keys_are_malformed() {
    // "No hat" reuses eyes.svg, so the manifest is rejected.
    let dir = fixture("catalog_dup", "");
    let err = TextureCatalog::load_dir(&dir).unwrap_err();
    assert!(matches!(err, PuffsError::MalformedMetadata { .. }));
    std::fs::remove_dir_all(&dir).ok();
}

fn good_fixture(name: &str, extra: &str) -> PathBuf {
    let dir = fixture(name, extra);
    std::fs::write(dir.join("none.svg"), SHAPE).unwrap();
    let manifest = std::fs::read_to_string(dir.join(MANIFEST_FILE))
        .unwrap()
        .replace(r#""path": "eyes.svg", "slot""#, r#""path": "none.svg", "slot""#);
    std::fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
    dir
}

#[test]
fn load_rasterizes_and_outlines_everything() {
    let dir = good_fixture("catalog_load", "");
    let mut catalog = TextureCatalog::load_dir(&dir).unwrap();
    assert_eq!(catalog.len(), 7);
    assert!(catalog.pending_tasks() > 0);

    catalog.pump_until_idle();
    assert_eq!(catalog.pending_tasks(), 0);

    let body = catalog.part(RigPart::Body).unwrap();
    assert_eq!(body.raster_runs(), 1);
    assert!(catalog.image("body.svg", false).is_some());
    assert!(catalog.image("hat.svg", true).unwrap().outlined);
    assert!(!catalog.image("body.svg", true).unwrap().outlined);

    let mut hats = catalog.keys_for_slot(Slot::Headwear);
    hats.sort_unstable();
    assert_eq!(hats, ["hat.svg", "none.svg"]);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn broken_attachment_is_skipped_but_broken_part_fails() {
    let dir = good_fixture(
        "catalog_broken",
        r#", {"name": "Gone", "path": "missing.svg", "attachment": "headwear", "transform": {}}"#,
    );
    let catalog = TextureCatalog::load_dir(&dir).unwrap();
    assert!(catalog.get("missing.svg").is_none());
    assert_eq!(catalog.len(), 7);

    std::fs::remove_file(dir.join("mouth.svg")).unwrap();
    let err = TextureCatalog::load_dir(&dir).unwrap_err();
    assert!(matches!(err, PuffsError::AssetLoad { ref key, .. } if key == "mouth.svg"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn recolor_coalesces_per_asset() {
    let dir = good_fixture("catalog_recolor", "");
    let mut catalog = TextureCatalog::load_dir(&dir).unwrap();
    catalog.pump_until_idle();

    // Three changes land on the same tick: one run plus one trailing rerun.
    catalog.recolor(Rgba8::new(0, 0, 255, 255));
    catalog.recolor(Rgba8::new(0, 255, 0, 255));
    catalog.recolor(Rgba8::new(0, 0, 255, 255));
    catalog.pump_until_idle();

    let body = catalog.part(RigPart::Body).unwrap();
    assert_eq!(body.raster_runs(), 3);
    let px = body.image(false).unwrap().pixmap.pixel(20, 20).unwrap();
    assert_eq!((px.red(), px.green(), px.blue()), (0, 0, 255));

    // Non-colorable assets are untouched.
    assert_eq!(catalog.get("hat.svg").unwrap().raster_runs(), 1);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn outline_settings_reach_outlined_assets_only() {
    let dir = good_fixture("catalog_outline", "");
    let mut catalog = TextureCatalog::load_dir(&dir).unwrap();
    catalog.pump_until_idle();

    catalog.set_outline_settings(OutlineSettings {
        color: Rgba8::BLACK,
        thickness: 1.0,
    });
    catalog.pump_until_idle();

    assert_eq!(catalog.get("hat.svg").unwrap().outline_runs(), 2);
    assert_eq!(catalog.get("body.svg").unwrap().outline_runs(), 0);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn upload_creates_equippable_attachment() {
    let mut catalog = TextureCatalog::new();
    let key = catalog
        .upload(Slot::Weapon, "C:\\pics\\axe.png", "image/png", &png_bytes())
        .unwrap();
    assert_eq!(key, "upload/1/axe.png");
    catalog.pump_until_idle();

    let asset = catalog.get(&key).unwrap();
    assert_eq!(asset.meta().attachment.behavior(), Some(BehaviorTag::Swing));
    assert_eq!((asset.width(), asset.height()), (2.0, 3.0));
    assert!(asset.image(true).unwrap().outlined);
    assert_eq!(catalog.keys_for_slot(Slot::Weapon), [key.as_str()]);
}

#[test]
fn upload_rejects_non_images() {
    let mut catalog = TextureCatalog::new();
    let err = catalog
        .upload(Slot::Headwear, "notes.txt", "text/plain", b"hello")
        .unwrap_err();
    assert!(matches!(err, PuffsError::InvalidUpload(_)));

    let err = catalog
        .upload(Slot::Headwear, "fake.png", "image/png", b"hello")
        .unwrap_err();
    assert!(matches!(err, PuffsError::InvalidUpload(_)));
    assert!(catalog.is_empty());
}

#[test]
fn set_placement_updates_attachment_metadata() {
    let mut catalog = TextureCatalog::new();
    let key = catalog
        .upload(Slot::Headwear, "hat.svg", "image/svg+xml", SHAPE.as_bytes())
        .unwrap();
    let placement = Placement {
        y: -12.0,
        scale_x: 2.0,
        ..Placement::default()
    };
    catalog.set_placement(&key, placement).unwrap();
    assert_eq!(
        catalog.get(&key).unwrap().meta().attachment.placement(),
        Some(placement)
    );

    assert!(catalog.set_placement("nope", placement).is_err());
    let bad = Placement {
        x: f64::NAN,
        ..Placement::default()
    };
    assert!(catalog.set_placement(&key, bad).is_err());
}

#[test]
fn replace_source_reprocesses_with_new_size() {
    let mut catalog = TextureCatalog::new();
    let key = catalog
        .upload(Slot::Headwear, "hat.svg", "image/svg+xml", SHAPE.as_bytes())
        .unwrap();
    catalog
        .replace_source(&key, SourceKind::Bitmap, &png_bytes())
        .unwrap();
    catalog.pump_until_idle();

    let asset = catalog.get(&key).unwrap();
    assert_eq!(asset.raster_runs(), 1);
    assert_eq!(asset.image(false).unwrap().pixmap.width(), 2);
}
