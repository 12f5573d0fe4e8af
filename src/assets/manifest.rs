use std::path::Path;

use anyhow::Context;

use crate::foundation::core::Placement;
use crate::foundation::error::{PuffsError, PuffsResult};

/// Default oversampling applied when rasterizing vector sources.
pub const DEFAULT_RESOLUTION: f64 = 4.0;

/// Kind of source art an asset is built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// SVG markup.
    #[default]
    Vector,
    /// Encoded raster image (PNG, JPEG, ...).
    Bitmap,
}

/// Weapon animation selected by an equipped weapon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorTag {
    /// Spring-driven arc toggle.
    Swing,
    /// Forward thrust along the aim direction.
    Jab,
}

/// Equipment slot an attachment occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Drawn on top of the head.
    Headwear,
    /// Held in the hand facing the pointer.
    Weapon,
}

/// Fixed body part of the character rig.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RigPart {
    /// Main body silhouette.
    Body,
    /// Eyes (blink + look offset).
    Eyes,
    /// Mouth (look offset).
    Mouth,
    /// Hand, drawn twice.
    Hand,
}

impl RigPart {
    /// Every part the rig needs to render.
    pub const ALL: [RigPart; 4] = [Self::Body, Self::Eyes, Self::Mouth, Self::Hand];
}

/// Attachment semantics of an asset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Attachment {
    /// Plain asset, or the "nothing equipped" choice of a slot.
    None,
    /// Swappable headwear.
    Headwear {
        /// Placement relative to the top of the body.
        placement: Placement,
    },
    /// Swappable weapon with its own motion.
    Weapon {
        /// Which animation drives it.
        behavior: BehaviorTag,
        /// Placement relative to the hand.
        placement: Placement,
    },
    /// Placeholder entry standing for "upload your own" in a slot.
    Upload {
        /// Slot the uploaded asset goes into.
        slot: Slot,
    },
}

impl Attachment {
    /// Placement, for attachments that are drawn on the rig.
    pub fn placement(&self) -> Option<Placement> {
        match *self {
            Self::Headwear { placement } | Self::Weapon { placement, .. } => Some(placement),
            Self::None | Self::Upload { .. } => None,
        }
    }

    /// Behavior tag, weapons only.
    pub fn behavior(&self) -> Option<BehaviorTag> {
        match *self {
            Self::Weapon { behavior, .. } => Some(behavior),
            _ => None,
        }
    }

    /// Replace the placement; returns false when the attachment carries none.
    pub fn set_placement(&mut self, new_placement: Placement) -> bool {
        match self {
            Self::Headwear { placement } | Self::Weapon { placement, .. } => {
                *placement = new_placement;
                true
            }
            Self::None | Self::Upload { .. } => false,
        }
    }
}

/// Attachment kind as written in the manifest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// See [`Attachment::None`].
    #[default]
    None,
    /// See [`Attachment::Headwear`].
    Headwear,
    /// See [`Attachment::Weapon`].
    Weapon,
    /// See [`Attachment::Upload`].
    Upload,
}

/// One raw manifest entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ManifestEntry {
    /// Display name.
    pub name: String,
    /// Path relative to the manifest directory; doubles as the asset key.
    pub path: String,
    /// Source art kind.
    #[serde(default)]
    pub source: SourceKind,
    /// Whether an outlined variant is maintained.
    #[serde(default)]
    pub outline: bool,
    /// Attachment kind.
    #[serde(default)]
    pub attachment: AttachmentKind,
    /// Weapon behavior tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<BehaviorTag>,
    /// Default placement transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Placement>,
    /// Rasterization oversampling for vector sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,
    /// Slot for `none` and `upload` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
    /// Rig part this asset provides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<RigPart>,
    /// Whether the body recolor applies to this asset.
    #[serde(default)]
    pub colorable: bool,
}

/// Validated per-asset metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetMeta {
    /// Display name.
    pub name: String,
    /// Attachment semantics.
    pub attachment: Attachment,
    /// Slot the asset belongs to, if any.
    pub slot: Option<Slot>,
    /// Rig part the asset provides, if any.
    pub part: Option<RigPart>,
    /// Whether an outlined variant is maintained.
    pub outline: bool,
    /// Whether body recolor applies.
    pub colorable: bool,
    /// Rasterization oversampling.
    pub resolution: f64,
}

/// Validated manifest entry ready to be loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetSpec {
    /// Normalized asset key.
    pub key: String,
    /// Source art kind.
    pub source: SourceKind,
    /// Metadata.
    pub meta: AssetMeta,
}

impl ManifestEntry {
    /// Check required attachment fields and build an [`AssetSpec`].
    pub fn validate(&self) -> PuffsResult<AssetSpec> {
        let entry = if self.name.is_empty() {
            self.path.as_str()
        } else {
            self.name.as_str()
        };
        let malformed = |reason: &str| PuffsError::malformed(entry, reason);

        let key = normalize_rel_path(&self.path).map_err(|e| malformed(&e.to_string()))?;

        if let Some(t) = &self.transform
            && !t.is_finite()
        {
            return Err(malformed("transform must be finite"));
        }
        if self.behavior.is_some() && self.attachment != AttachmentKind::Weapon {
            return Err(malformed("behavior is only valid on weapon entries"));
        }

        let attachment = match self.attachment {
            AttachmentKind::None => Attachment::None,
            AttachmentKind::Headwear => Attachment::Headwear {
                placement: self
                    .transform
                    .ok_or_else(|| malformed("headwear entries require a transform"))?,
            },
            AttachmentKind::Weapon => Attachment::Weapon {
                behavior: self
                    .behavior
                    .ok_or_else(|| malformed("weapon entries require a behavior"))?,
                placement: self
                    .transform
                    .ok_or_else(|| malformed("weapon entries require a transform"))?,
            },
            AttachmentKind::Upload => Attachment::Upload {
                slot: self
                    .slot
                    .ok_or_else(|| malformed("upload entries require a slot"))?,
            },
        };

        let slot = match attachment {
            Attachment::Headwear { .. } => Some(Slot::Headwear),
            Attachment::Weapon { .. } => Some(Slot::Weapon),
            Attachment::Upload { slot } => Some(slot),
            Attachment::None => self.slot,
        };
        if let (Some(declared), Some(derived)) = (self.slot, slot)
            && declared != derived
        {
            return Err(malformed("slot disagrees with attachment kind"));
        }
        if self.part.is_some() && !matches!(attachment, Attachment::None) {
            return Err(malformed("rig parts cannot also be attachments"));
        }

        let resolution = self.resolution.unwrap_or(DEFAULT_RESOLUTION);
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(malformed("resolution must be finite and > 0"));
        }

        Ok(AssetSpec {
            key,
            source: self.source,
            meta: AssetMeta {
                name: self.name.clone(),
                attachment,
                slot,
                part: self.part,
                outline: self.outline,
                colorable: self.colorable,
                resolution,
            },
        })
    }
}

/// Static list of assets loaded once at startup.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    /// Entries in declaration order.
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Parse manifest JSON.
    pub fn from_json(json: &str) -> PuffsResult<Self> {
        serde_json::from_str(json).map_err(|e| PuffsError::serde(e.to_string()))
    }

    /// Read and parse a manifest file.
    pub fn from_path(path: &Path) -> PuffsResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read manifest '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// Validate every entry, failing on the first malformed one.
    pub fn validate(&self) -> PuffsResult<Vec<AssetSpec>> {
        let specs = self
            .entries
            .iter()
            .map(ManifestEntry::validate)
            .collect::<PuffsResult<Vec<_>>>()?;

        for part in RigPart::ALL {
            let n = specs.iter().filter(|s| s.meta.part == Some(part)).count();
            if n != 1 {
                return Err(PuffsError::malformed(
                    "manifest",
                    format!("expected exactly one {part:?} part, found {n}"),
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for s in &specs {
            if !seen.insert(s.key.as_str()) {
                return Err(PuffsError::malformed(
                    s.key.as_str(),
                    "duplicate asset path",
                ));
            }
        }

        Ok(specs)
    }
}

/// Normalize and validate manifest-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> PuffsResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PuffsError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(PuffsError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PuffsError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(PuffsError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/manifest.rs"]
mod tests;
