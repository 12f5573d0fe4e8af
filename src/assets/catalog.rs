use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::assets::decode::source_kind_for_mime;
use crate::assets::manifest::{
    AssetMeta, AssetSpec, Attachment, BehaviorTag, DEFAULT_RESOLUTION, Manifest, RigPart,
    SourceKind, Slot,
};
use crate::assets::texture::{Admission, ImageRef, TaskQueue, TextureAsset};
use crate::foundation::core::{Placement, Rgba8};
use crate::foundation::error::{PuffsError, PuffsResult};
use crate::render::outline::{OutlineSettings, Outliner};

/// File name of the manifest inside an asset directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Every loaded asset plus the queue of pending processing work.
///
/// Work requested through the catalog is only queued; [`TextureCatalog::pump`] runs it,
/// normally between frames.
#[derive(Debug, Default)]
pub struct TextureCatalog {
    assets: Vec<TextureAsset>,
    index: HashMap<String, usize>,
    queue: TaskQueue,
    outliner: Outliner,
    outline_settings: OutlineSettings,
    body_color: Option<Rgba8>,
    uploads: u64,
}

impl TextureCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `<dir>/manifest.json` and every asset it lists.
    #[tracing::instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load_dir(dir: &Path) -> PuffsResult<Self> {
        let manifest = Manifest::from_path(&dir.join(MANIFEST_FILE))?;
        Self::load_manifest(dir, &manifest)
    }

    /// Load every asset in `manifest`, resolving paths against `dir`.
    ///
    /// Malformed entries fail the whole load. A broken rig part is an [`PuffsError::AssetLoad`];
    /// any other broken asset is logged and left out.
    #[tracing::instrument(skip_all, fields(dir = %dir.display(), entries = manifest.entries.len()))]
    pub fn load_manifest(dir: &Path, manifest: &Manifest) -> PuffsResult<Self> {
        let specs = manifest.validate()?;
        let mut catalog = Self::new();

        for spec in specs {
            match load_spec(dir, &spec) {
                Ok(asset) => catalog.insert(asset)?,
                Err(err) if spec.meta.part.is_some() => return Err(err),
                Err(err) => {
                    tracing::warn!(key = %spec.key, error = %err, "skipping broken asset");
                }
            }
        }

        tracing::debug!(assets = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Add an asset and schedule its first rasterize; keys must be unique.
    pub fn insert(&mut self, mut asset: TextureAsset) -> PuffsResult<()> {
        if self.index.contains_key(asset.key()) {
            return Err(PuffsError::validation(format!(
                "asset '{}' already loaded",
                asset.key()
            )));
        }
        if asset.meta().colorable {
            asset.set_fill_override(self.body_color);
        }
        asset.outline(self.outline_settings, &mut self.queue);
        asset.rasterize(&mut self.queue);

        self.index.insert(asset.key().to_owned(), self.assets.len());
        self.assets.push(asset);
        Ok(())
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the catalog holds no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Asset by key.
    pub fn get(&self, key: &str) -> Option<&TextureAsset> {
        self.index.get(key).map(|&i| &self.assets[i])
    }

    /// Mutable asset by key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut TextureAsset> {
        self.index.get(key).map(|&i| &mut self.assets[i])
    }

    /// Assets in load order.
    pub fn iter(&self) -> impl Iterator<Item = &TextureAsset> {
        self.assets.iter()
    }

    /// The asset providing a rig part.
    pub fn part(&self, part: RigPart) -> Option<&TextureAsset> {
        self.assets.iter().find(|a| a.meta().part == Some(part))
    }

    /// Latest bitmap of an asset; see [`TextureAsset::image`].
    pub fn image(&self, key: &str, want_outlined: bool) -> Option<ImageRef<'_>> {
        self.get(key).and_then(|a| a.image(want_outlined))
    }

    /// Keys that can be equipped into `slot`, including its "nothing" entries.
    pub fn keys_for_slot(&self, slot: Slot) -> Vec<&str> {
        self.assets
            .iter()
            .filter(|a| a.meta().slot == Some(slot))
            .filter(|a| !matches!(a.meta().attachment, Attachment::Upload { .. }))
            .map(TextureAsset::key)
            .collect()
    }

    /// Current outline settings.
    pub fn outline_settings(&self) -> OutlineSettings {
        self.outline_settings
    }

    /// Current body recolor, if any.
    pub fn body_color(&self) -> Option<Rgba8> {
        self.body_color
    }

    /// Request a rasterize of one asset.
    pub fn rasterize(&mut self, key: &str) -> PuffsResult<Admission> {
        let i = self.position(key)?;
        Ok(self.assets[i].rasterize(&mut self.queue))
    }

    /// Request an outline of one asset with the current settings.
    pub fn outline(&mut self, key: &str) -> PuffsResult<Admission> {
        let i = self.position(key)?;
        Ok(self.assets[i].outline(self.outline_settings, &mut self.queue))
    }

    /// Change the global outline and re-outline every asset that keeps one.
    pub fn set_outline_settings(&mut self, settings: OutlineSettings) {
        if settings == self.outline_settings {
            return;
        }
        self.outline_settings = settings;
        for asset in &mut self.assets {
            asset.outline(settings, &mut self.queue);
        }
    }

    /// Recolor every colorable asset and re-rasterize them.
    pub fn recolor(&mut self, color: Rgba8) {
        if self.body_color == Some(color) {
            return;
        }
        self.body_color = Some(color);
        for asset in self.assets.iter_mut().filter(|a| a.meta().colorable) {
            asset.set_fill_override(Some(color));
            asset.rasterize(&mut self.queue);
        }
    }

    /// Replace an asset's source art and re-rasterize it.
    pub fn replace_source(&mut self, key: &str, kind: SourceKind, bytes: &[u8]) -> PuffsResult<()> {
        let i = self.position(key)?;
        let asset = &mut self.assets[i];
        asset.replace_source(kind, bytes)?;
        asset.rasterize(&mut self.queue);
        Ok(())
    }

    /// Add a user-uploaded file as a new attachment for `slot` and return its key.
    ///
    /// SVG becomes a vector source, any other `image/*` a bitmap source; everything else is an
    /// [`PuffsError::InvalidUpload`].
    pub fn upload(
        &mut self,
        slot: Slot,
        file_name: &str,
        mime: &str,
        bytes: &[u8],
    ) -> PuffsResult<String> {
        let kind = source_kind_for_mime(mime)?;
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("upload");

        self.uploads += 1;
        let key = format!("upload/{}/{base}", self.uploads);
        let attachment = match slot {
            Slot::Headwear => Attachment::Headwear {
                placement: Placement::default(),
            },
            Slot::Weapon => Attachment::Weapon {
                behavior: BehaviorTag::Swing,
                placement: Placement::default(),
            },
        };
        let meta = AssetMeta {
            name: base.to_owned(),
            attachment,
            slot: Some(slot),
            part: None,
            outline: true,
            colorable: false,
            resolution: match kind {
                SourceKind::Vector => DEFAULT_RESOLUTION,
                SourceKind::Bitmap => 1.0,
            },
        };

        let asset = TextureAsset::load(key.as_str(), kind, bytes, meta)
            .map_err(|e| PuffsError::invalid_upload(format!("could not read '{base}': {e}")))?;
        tracing::debug!(%key, ?slot, ?kind, "uploaded asset");
        self.insert(asset)?;
        Ok(key)
    }

    /// Push an externally edited placement onto an attachment.
    pub fn set_placement(&mut self, key: &str, placement: Placement) -> PuffsResult<()> {
        if !placement.is_finite() {
            return Err(PuffsError::validation("placement must be finite"));
        }
        let i = self.position(key)?;
        if !self.assets[i].meta_mut().attachment.set_placement(placement) {
            return Err(PuffsError::validation(format!(
                "asset '{key}' has no placement to edit"
            )));
        }
        Ok(())
    }

    /// Queued tasks not yet run.
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Run up to `budget` queued tasks; returns how many ran.
    pub fn pump(&mut self, budget: usize) -> usize {
        let mut ran = 0;
        while ran < budget {
            let Some(task) = self.queue.pop_front() else {
                break;
            };
            ran += 1;
            match self.index.get(&task.key) {
                Some(&i) => self.assets[i].run_task(&task, &mut self.outliner, &mut self.queue),
                None => tracing::debug!(key = %task.key, "dropped task for unknown asset"),
            }
        }
        ran
    }

    /// Run queued tasks, including follow-ups they schedule, until the queue is empty.
    pub fn pump_until_idle(&mut self) -> usize {
        self.pump(usize::MAX)
    }

    fn position(&self, key: &str) -> PuffsResult<usize> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| PuffsError::validation(format!("unknown asset '{key}'")))
    }
}

fn load_spec(dir: &Path, spec: &AssetSpec) -> PuffsResult<TextureAsset> {
    let path = dir.join(&spec.key);
    let bytes = std::fs::read(&path)
        .with_context(|| format!("read asset '{}'", path.display()))
        .map_err(|e| PuffsError::asset_load(spec.key.as_str(), format!("{e:#}")))?;
    TextureAsset::load(spec.key.as_str(), spec.source, &bytes, spec.meta.clone())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/catalog.rs"]
mod tests;
