use super::*;
use crate::assets::manifest::Attachment;

const SQUARE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2">
  <rect id="colorable" x="0" y="0" width="4" height="2" fill="#ff0000"/>
</svg>"##;

fn meta(outline: bool) -> AssetMeta {
    AssetMeta {
        name: "Square".to_owned(),
        attachment: Attachment::None,
        slot: None,
        part: None,
        outline,
        colorable: true,
        resolution: 2.0,
    }
}

fn drain(asset: &mut TextureAsset, queue: &mut TaskQueue, outliner: &mut Outliner) -> usize {
    let mut n = 0;
    while let Some(task) = queue.pop_front() {
        asset.run_task(&task, outliner, queue);
        n += 1;
    }
    n
}

#[test]
fn coalescer_walks_the_state_machine() {
    let mut c = Coalescer::default();
    assert_eq!(c.request(), Admission::Start);
    assert_eq!(c.state(), WorkState::Running);
    assert_eq!(c.request(), Admission::Coalesced);
    assert_eq!(c.request(), Admission::Coalesced);
    assert_eq!(c.state(), WorkState::RunningWithRerun);
    assert_eq!(c.finish(), Completion::Rerun);
    assert_eq!(c.state(), WorkState::Running);
    assert_eq!(c.finish(), Completion::Idle);
    assert_eq!(c.state(), WorkState::Idle);
}

#[test]
fn load_records_natural_size_and_starts_idle() {
    let asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(false)).unwrap();
    assert_eq!((asset.width(), asset.height()), (4.0, 2.0));
    assert_eq!(asset.processing_state(), ProcessingState::Idle);
    assert!(asset.image(false).is_none());
}

#[test]
fn load_failure_is_asset_load_error() {
    let err = TextureAsset::load("bad.svg", SourceKind::Vector, b"<nope", meta(false)).unwrap_err();
    assert!(matches!(err, PuffsError::AssetLoad { ref key, .. } if key == "bad.svg"));
}

#[test]
fn many_requests_mid_flight_cause_exactly_one_rerun() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(false)).unwrap();
    let mut queue = TaskQueue::new();
    let mut outliner = Outliner::new();

    assert_eq!(asset.rasterize(&mut queue), Admission::Start);
    for _ in 0..5 {
        assert_eq!(asset.rasterize(&mut queue), Admission::Coalesced);
    }
    assert_eq!(queue.len(), 1);
    assert!(asset.raster_pending());
    assert_eq!(asset.processing_state(), ProcessingState::Rasterizing);

    drain(&mut asset, &mut queue, &mut outliner);
    assert_eq!(asset.raster_runs(), 2);
    assert_eq!(asset.raster_generation(), 2);
    assert_eq!(asset.processing_state(), ProcessingState::Idle);
}

#[test]
fn single_request_runs_once() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(false)).unwrap();
    let mut queue = TaskQueue::new();
    asset.rasterize(&mut queue);
    drain(&mut asset, &mut queue, &mut Outliner::new());
    assert_eq!(asset.raster_runs(), 1);

    let img = asset.image(false).unwrap();
    assert_eq!((img.pixmap.width(), img.pixmap.height()), (8, 4));
    assert!(!img.outlined);
}

#[test]
fn rasterize_is_followed_by_outline_when_supported() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(true)).unwrap();
    let mut queue = TaskQueue::new();
    asset.rasterize(&mut queue);
    drain(&mut asset, &mut queue, &mut Outliner::new());

    assert_eq!(asset.outline_runs(), 1);
    let img = asset.image(true).unwrap();
    assert!(img.outlined);
    // Default thickness 3 units at 2 px/unit pads 6 px per side.
    assert_eq!(img.pixmap.width(), 8 + 12);
    let (w, h) = asset.image_size(&img);
    assert_eq!((w, h), (10.0, 8.0));
}

#[test]
fn failed_rasterize_keeps_previous_raster() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(false)).unwrap();
    let mut queue = TaskQueue::new();
    let mut outliner = Outliner::new();
    asset.rasterize(&mut queue);
    drain(&mut asset, &mut queue, &mut outliner);
    assert_eq!(asset.raster_generation(), 1);

    // 4 units at 5000 px/unit is past the raster size limit.
    asset.meta_mut().resolution = 5_000.0;
    asset.rasterize(&mut queue);
    drain(&mut asset, &mut queue, &mut outliner);

    assert_eq!(asset.raster_runs(), 2);
    assert_eq!(asset.raster_generation(), 1);
    assert_eq!(asset.processing_state(), ProcessingState::Idle);
    let img = asset.image(false).unwrap();
    assert_eq!((img.pixmap.width(), img.pixmap.height()), (8, 4));
    assert_eq!(img.generation, 1);

    // The coalescer is idle again, so the next request starts fresh.
    asset.meta_mut().resolution = 2.0;
    assert_eq!(asset.rasterize(&mut queue), Admission::Start);
}

#[test]
fn failed_outline_keeps_previous_outlined_bitmap() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(true)).unwrap();
    let mut queue = TaskQueue::new();
    let mut outliner = Outliner::new();
    asset.rasterize(&mut queue);
    drain(&mut asset, &mut queue, &mut outliner);
    assert_eq!(asset.outline_generation(), 1);

    let huge = OutlineSettings {
        thickness: 1e9,
        ..OutlineSettings::default()
    };
    assert_eq!(asset.outline(huge, &mut queue), Admission::Start);
    drain(&mut asset, &mut queue, &mut outliner);

    assert_eq!(asset.outline_runs(), 2);
    assert_eq!(asset.outline_generation(), 1);
    assert_eq!(asset.processing_state(), ProcessingState::Idle);
    let img = asset.image(true).unwrap();
    assert!(img.outlined);
    assert_eq!(img.pixmap.width(), 8 + 12);

    assert_eq!(
        asset.outline(OutlineSettings::default(), &mut queue),
        Admission::Start
    );
}

#[test]
fn outline_request_without_support_is_skipped() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(false)).unwrap();
    let mut queue = TaskQueue::new();
    assert_eq!(
        asset.outline(OutlineSettings::default(), &mut queue),
        Admission::Skipped
    );
    assert!(queue.is_empty());

    asset.rasterize(&mut queue);
    drain(&mut asset, &mut queue, &mut Outliner::new());
    assert!(!asset.image(true).unwrap().outlined);
}

#[test]
fn latest_outline_settings_win() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(true)).unwrap();
    let mut queue = TaskQueue::new();
    let mut outliner = Outliner::new();
    asset.rasterize(&mut queue);
    drain(&mut asset, &mut queue, &mut outliner);

    let thin = OutlineSettings {
        color: Rgba8::BLACK,
        thickness: 1.0,
    };
    let thick = OutlineSettings { thickness: 2.0, ..thin };
    asset.outline(thin, &mut queue);
    asset.outline(thick, &mut queue);
    assert_eq!(queue.len(), 1);
    drain(&mut asset, &mut queue, &mut outliner);

    assert_eq!(asset.outline_runs(), 3);
    assert_eq!(asset.outline_settings(), thick);
    assert_eq!(asset.image(true).unwrap().pixmap.width(), 8 + 8);
}

#[test]
fn fill_override_recolors_on_next_rasterize() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(false)).unwrap();
    let mut queue = TaskQueue::new();
    let mut outliner = Outliner::new();
    asset.set_fill_override(Some(Rgba8::new(0, 0, 255, 255)));
    asset.rasterize(&mut queue);
    drain(&mut asset, &mut queue, &mut outliner);

    let px = asset.image(false).unwrap().pixmap.pixel(4, 2).unwrap();
    assert_eq!((px.red(), px.blue()), (0, 255));
}

#[test]
fn replace_source_drops_stale_tasks() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(false)).unwrap();
    let mut queue = TaskQueue::new();
    let mut outliner = Outliner::new();
    asset.rasterize(&mut queue);

    let wide = br#"<svg xmlns="http://www.w3.org/2000/svg" width="6" height="2"><rect width="6" height="2"/></svg>"#;
    asset.replace_source(SourceKind::Vector, wide).unwrap();
    assert_eq!(asset.processing_state(), ProcessingState::Idle);
    assert_eq!(asset.epoch(), 1);

    // The queued task belongs to the old epoch and is ignored.
    drain(&mut asset, &mut queue, &mut outliner);
    assert_eq!(asset.raster_runs(), 0);

    asset.rasterize(&mut queue);
    drain(&mut asset, &mut queue, &mut outliner);
    assert_eq!(asset.image(false).unwrap().pixmap.width(), 12);
}

#[test]
fn failed_replace_keeps_previous_source() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(false)).unwrap();
    assert!(asset.replace_source(SourceKind::Bitmap, b"junk").is_err());
    assert_eq!(asset.width(), 4.0);
    assert_eq!(asset.epoch(), 0);
}

#[test]
fn outline_waits_for_rasterize_in_flight() {
    let mut asset = TextureAsset::load("sq.svg", SourceKind::Vector, SQUARE, meta(true)).unwrap();
    let mut queue = TaskQueue::new();
    asset.rasterize(&mut queue);

    let thin = OutlineSettings {
        color: Rgba8::BLACK,
        thickness: 1.0,
    };
    assert_eq!(asset.outline(thin, &mut queue), Admission::Deferred);
    assert_eq!(queue.len(), 1);

    drain(&mut asset, &mut queue, &mut Outliner::new());
    assert_eq!(asset.outline_runs(), 1);
    assert_eq!(asset.image(true).unwrap().pixmap.width(), 8 + 4);
}
