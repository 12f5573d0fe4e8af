use std::collections::VecDeque;
use std::sync::Arc;

use resvg::tiny_skia::Pixmap;

use crate::assets::decode::{
    decode_bitmap, parse_svg, raster_size, rasterize_svg, recolor_style_sheet,
};
use crate::assets::manifest::{AssetMeta, SourceKind};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{PuffsError, PuffsResult};
use crate::render::outline::{OutlineSettings, Outliner};

/// Coalescing state of one kind of work on one asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// One run in flight.
    Running,
    /// One run in flight and exactly one more owed after it.
    RunningWithRerun,
}

/// Result of asking for work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The caller must schedule a run.
    Start,
    /// Folded into the pending rerun of the run in flight.
    Coalesced,
    /// The asset keeps no outlined variant.
    Skipped,
    /// Held until the rasterize in flight (or the first successful one) lands.
    Deferred,
}

/// Result of finishing a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// A request arrived mid-run; the caller must schedule one more run.
    Rerun,
    /// Back to idle.
    Idle,
}

/// `Idle -> Running -> RunningWithRerun -> Running -> Idle` admission control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Coalescer {
    state: WorkState,
}

impl Coalescer {
    /// Current state.
    pub fn state(&self) -> WorkState {
        self.state
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.state != WorkState::Idle
    }

    /// Whether a trailing rerun is owed.
    pub fn is_pending(&self) -> bool {
        self.state == WorkState::RunningWithRerun
    }

    /// Ask for a run.
    pub fn request(&mut self) -> Admission {
        match self.state {
            WorkState::Idle => {
                self.state = WorkState::Running;
                Admission::Start
            }
            WorkState::Running | WorkState::RunningWithRerun => {
                self.state = WorkState::RunningWithRerun;
                Admission::Coalesced
            }
        }
    }

    /// Report that the run in flight finished (successfully or not).
    pub fn finish(&mut self) -> Completion {
        match self.state {
            WorkState::RunningWithRerun => {
                self.state = WorkState::Running;
                Completion::Rerun
            }
            WorkState::Running | WorkState::Idle => {
                self.state = WorkState::Idle;
                Completion::Idle
            }
        }
    }

    /// Forget any in-flight or owed run.
    pub fn reset(&mut self) {
        self.state = WorkState::Idle;
    }
}

/// Which processing step a task runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkKind {
    /// Source art to raster bitmap.
    Rasterize,
    /// Raster bitmap to outlined bitmap.
    Outline,
}

/// Scheduled unit of asset work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Asset key.
    pub key: String,
    /// Step to run.
    pub kind: WorkKind,
    /// Source epoch the task was scheduled against; stale epochs are dropped.
    pub epoch: u64,
}

/// FIFO of scheduled asset work, drained between frames.
pub type TaskQueue = VecDeque<Task>;

/// Overall processing state as seen from outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessingState {
    /// Nothing in flight.
    Idle,
    /// A rasterize run is in flight.
    Rasterizing,
    /// An outline run is in flight.
    Outlining,
}

/// Source art behind an asset.
#[derive(Clone, Debug)]
pub enum Source {
    /// SVG markup, re-parsed on each rasterize so recolors apply.
    Vector(Arc<[u8]>),
    /// Decoded premultiplied bitmap.
    Bitmap(Arc<Pixmap>),
}

impl Source {
    /// Decode `bytes` of the given kind, returning the source and its natural size.
    pub fn decode(kind: SourceKind, bytes: &[u8]) -> PuffsResult<(Self, f64, f64)> {
        match kind {
            SourceKind::Vector => {
                let tree = parse_svg(bytes, None)?;
                let size = tree.size();
                Ok((
                    Self::Vector(Arc::from(bytes)),
                    f64::from(size.width()),
                    f64::from(size.height()),
                ))
            }
            SourceKind::Bitmap => {
                let pixmap = decode_bitmap(bytes)?;
                let (w, h) = (f64::from(pixmap.width()), f64::from(pixmap.height()));
                Ok((Self::Bitmap(Arc::new(pixmap)), w, h))
            }
        }
    }

    /// Kind of this source.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Vector(_) => SourceKind::Vector,
            Self::Bitmap(_) => SourceKind::Bitmap,
        }
    }
}

/// Borrowed bitmap plus the generation it was produced at.
#[derive(Clone, Copy, Debug)]
pub struct ImageRef<'a> {
    /// Pixels.
    pub pixmap: &'a Pixmap,
    /// Monotonic counter bumped each time these pixels are replaced.
    pub generation: u64,
    /// Whether this is the outlined variant.
    pub outlined: bool,
}

/// One visual asset: source art, raster bitmap, optional outlined bitmap, and the coalescing
/// state of both processing steps.
#[derive(Debug)]
pub struct TextureAsset {
    key: String,
    meta: AssetMeta,
    source: Source,
    width: f64,
    height: f64,
    fill_override: Option<Rgba8>,
    raster: Option<Pixmap>,
    outlined: Option<Pixmap>,
    raster_generation: u64,
    outline_generation: u64,
    raster_work: Coalescer,
    outline_work: Coalescer,
    outline_settings: OutlineSettings,
    epoch: u64,
    raster_runs: u64,
    outline_runs: u64,
}

impl TextureAsset {
    /// Decode the source and create an idle asset with no bitmaps yet.
    ///
    /// Call [`TextureAsset::rasterize`] afterwards; the catalog does this on load.
    pub fn load(
        key: impl Into<String>,
        kind: SourceKind,
        bytes: &[u8],
        meta: AssetMeta,
    ) -> PuffsResult<Self> {
        let key = key.into();
        let (source, width, height) = Source::decode(kind, bytes)
            .map_err(|e| PuffsError::asset_load(key.as_str(), e.to_string()))?;
        Ok(Self::from_source(key, source, width, height, meta))
    }

    /// Create an idle asset from an already decoded source.
    pub fn from_source(
        key: impl Into<String>,
        source: Source,
        width: f64,
        height: f64,
        meta: AssetMeta,
    ) -> Self {
        Self {
            key: key.into(),
            meta,
            source,
            width,
            height,
            fill_override: None,
            raster: None,
            outlined: None,
            raster_generation: 0,
            outline_generation: 0,
            raster_work: Coalescer::default(),
            outline_work: Coalescer::default(),
            outline_settings: OutlineSettings::default(),
            epoch: 0,
            raster_runs: 0,
            outline_runs: 0,
        }
    }

    /// Swap in new source art; in-flight and owed work is forgotten and previous bitmaps stay
    /// visible until the next rasterize lands.
    pub fn replace_source(&mut self, kind: SourceKind, bytes: &[u8]) -> PuffsResult<()> {
        let (source, width, height) = Source::decode(kind, bytes)
            .map_err(|e| PuffsError::asset_load(self.key.as_str(), e.to_string()))?;
        self.source = source;
        self.width = width;
        self.height = height;
        self.epoch += 1;
        self.raster_work.reset();
        self.outline_work.reset();
        Ok(())
    }

    /// Stable key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Metadata.
    pub fn meta(&self) -> &AssetMeta {
        &self.meta
    }

    /// Mutable metadata (placement edits).
    pub fn meta_mut(&mut self) -> &mut AssetMeta {
        &mut self.meta
    }

    /// Natural width in logical units.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Natural height in logical units.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Source kind.
    pub fn source_kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Whether an outlined variant is maintained.
    pub fn supports_outline(&self) -> bool {
        self.meta.outline
    }

    /// Source epoch; bumped by [`TextureAsset::replace_source`].
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Overall processing state.
    pub fn processing_state(&self) -> ProcessingState {
        if self.raster_work.is_running() {
            ProcessingState::Rasterizing
        } else if self.outline_work.is_running() {
            ProcessingState::Outlining
        } else {
            ProcessingState::Idle
        }
    }

    /// Whether a trailing rasterize is owed.
    pub fn raster_pending(&self) -> bool {
        self.raster_work.is_pending()
    }

    /// Whether a trailing outline is owed.
    pub fn outline_pending(&self) -> bool {
        self.outline_work.is_pending()
    }

    /// Completed rasterize runs, including failed ones.
    pub fn raster_runs(&self) -> u64 {
        self.raster_runs
    }

    /// Completed outline runs, including failed ones.
    pub fn outline_runs(&self) -> u64 {
        self.outline_runs
    }

    /// Raster bitmap generation (0 until the first successful run).
    pub fn raster_generation(&self) -> u64 {
        self.raster_generation
    }

    /// Outline bitmap generation (0 until the first successful run).
    pub fn outline_generation(&self) -> u64 {
        self.outline_generation
    }

    /// Settings the next outline run will use.
    pub fn outline_settings(&self) -> OutlineSettings {
        self.outline_settings
    }

    /// Fill color applied to the `#colorable` element, if any.
    pub fn fill_override(&self) -> Option<Rgba8> {
        self.fill_override
    }

    /// Set the recolor fill; takes effect on the next rasterize.
    pub fn set_fill_override(&mut self, color: Option<Rgba8>) {
        self.fill_override = color;
    }

    /// Latest bitmap: the outlined one when asked for and available, else the raster.
    pub fn image(&self, want_outlined: bool) -> Option<ImageRef<'_>> {
        if want_outlined
            && self.supports_outline()
            && let Some(pixmap) = &self.outlined
        {
            return Some(ImageRef {
                pixmap,
                generation: self.outline_generation,
                outlined: true,
            });
        }
        self.raster.as_ref().map(|pixmap| ImageRef {
            pixmap,
            generation: self.raster_generation,
            outlined: false,
        })
    }

    /// Request a rasterize; schedules a task unless one is already in flight.
    pub fn rasterize(&mut self, queue: &mut TaskQueue) -> Admission {
        let admission = self.raster_work.request();
        self.admit(admission, WorkKind::Rasterize, queue);
        admission
    }

    /// Request an outline with `settings`; the latest settings win when the run starts.
    pub fn outline(&mut self, settings: OutlineSettings, queue: &mut TaskQueue) -> Admission {
        self.outline_settings = settings;
        if !self.supports_outline() {
            return Admission::Skipped;
        }
        if self.raster.is_none() || self.raster_work.is_running() {
            return Admission::Deferred;
        }
        let admission = self.outline_work.request();
        self.admit(admission, WorkKind::Outline, queue);
        admission
    }

    fn admit(&self, admission: Admission, kind: WorkKind, queue: &mut TaskQueue) {
        match admission {
            Admission::Start => queue.push_back(self.task(kind)),
            Admission::Coalesced => {
                tracing::debug!(key = %self.key, ?kind, "coalesced request into pending rerun");
            }
            Admission::Skipped | Admission::Deferred => {}
        }
    }

    fn task(&self, kind: WorkKind) -> Task {
        Task {
            key: self.key.clone(),
            kind,
            epoch: self.epoch,
        }
    }

    /// Execute one scheduled task, then advance the coalescing state and schedule follow-ups.
    ///
    /// Failures are logged and leave the previous bitmap in place. Tasks from an older epoch
    /// are dropped.
    pub fn run_task(&mut self, task: &Task, outliner: &mut Outliner, queue: &mut TaskQueue) {
        if task.epoch != self.epoch {
            tracing::debug!(key = %self.key, kind = ?task.kind, "dropped stale task");
            return;
        }

        match task.kind {
            WorkKind::Rasterize => {
                if let Err(err) = self.run_rasterize() {
                    tracing::warn!(key = %self.key, error = %err, "rasterize failed, keeping previous bitmap");
                }
                self.raster_runs += 1;
                match self.raster_work.finish() {
                    Completion::Rerun => {
                        tracing::debug!(key = %self.key, "trailing rasterize rerun");
                        queue.push_back(self.task(WorkKind::Rasterize));
                    }
                    Completion::Idle => {
                        if self.supports_outline() {
                            let settings = self.outline_settings;
                            self.outline(settings, queue);
                        }
                    }
                }
            }
            WorkKind::Outline => {
                if let Err(err) = self.run_outline(outliner) {
                    tracing::warn!(key = %self.key, error = %err, "outline failed, keeping previous bitmap");
                }
                self.outline_runs += 1;
                if self.outline_work.finish() == Completion::Rerun {
                    tracing::debug!(key = %self.key, "trailing outline rerun");
                    queue.push_back(self.task(WorkKind::Outline));
                }
            }
        }
    }

    fn run_rasterize(&mut self) -> PuffsResult<()> {
        let pixmap = match &self.source {
            Source::Vector(bytes) => {
                let css = match self.fill_override {
                    Some(color) if self.meta.colorable => Some(recolor_style_sheet(color)),
                    _ => None,
                };
                let tree = parse_svg(bytes, css.as_deref())?;
                let (w, h) = raster_size(self.width, self.height, self.meta.resolution)?;
                rasterize_svg(&tree, w, h)?
            }
            Source::Bitmap(pixmap) => Pixmap::clone(pixmap),
        };
        self.raster = Some(pixmap);
        self.raster_generation += 1;
        Ok(())
    }

    fn run_outline(&mut self, outliner: &mut Outliner) -> PuffsResult<()> {
        let raster = self
            .raster
            .as_ref()
            .ok_or_else(|| PuffsError::render("outline requested before rasterize"))?;

        // Outline thickness is in logical units; the raster is oversampled.
        let px_per_unit = f64::from(raster.width()) / self.width;
        let settings = self.outline_settings.scaled(px_per_unit);
        let pad = settings
            .ring_padding()?
            .checked_mul(2)
            .ok_or_else(|| PuffsError::render("outline padding overflows"))?;
        let grow = |side: u32| {
            side.checked_add(pad)
                .ok_or_else(|| PuffsError::render("outlined size overflows"))
        };
        let (w, h) = (grow(raster.width())?, grow(raster.height())?);
        let (rw, rh) = (f64::from(raster.width()), f64::from(raster.height()));

        let out = outliner.process(w, h, &settings, |canvas| {
            canvas.draw_image_centered(raster, rw, rh);
        })?;
        self.outlined = Some(out.clone());
        self.outline_generation += 1;
        Ok(())
    }

    /// Logical size of the image returned by [`TextureAsset::image`], padding included.
    pub fn image_size(&self, image: &ImageRef<'_>) -> (f64, f64) {
        let Some(raster) = &self.raster else {
            return (self.width, self.height);
        };
        let sx = self.width / f64::from(raster.width());
        let sy = self.height / f64::from(raster.height());
        (
            f64::from(image.pixmap.width()) * sx,
            f64::from(image.pixmap.height()) * sy,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/texture.rs"]
mod tests;
