/// Convenience result type used across puffs.
pub type PuffsResult<T> = Result<T, PuffsError>;

/// Top-level error taxonomy used by the asset pipeline, rig and frame driver.
#[derive(thiserror::Error, Debug)]
pub enum PuffsError {
    /// Fetching, parsing or decoding an asset's source failed.
    #[error("asset load error ({key}): {reason}")]
    AssetLoad {
        /// Asset key (manifest path or upload key).
        key: String,
        /// Human readable cause.
        reason: String,
    },

    /// A user upload had an unsupported file type or could not be used.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// A manifest entry is missing required attachment fields.
    #[error("malformed metadata for '{entry}': {reason}")]
    MalformedMetadata {
        /// Manifest entry name or path.
        entry: String,
        /// Which field is missing or inconsistent.
        reason: String,
    },

    /// Invalid caller-provided data (settings, colors, dimensions).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while drawing a frame or processing a bitmap.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PuffsError {
    /// Build a [`PuffsError::AssetLoad`] value.
    pub fn asset_load(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetLoad {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`PuffsError::InvalidUpload`] value.
    pub fn invalid_upload(msg: impl Into<String>) -> Self {
        Self::InvalidUpload(msg.into())
    }

    /// Build a [`PuffsError::MalformedMetadata`] value.
    pub fn malformed(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`PuffsError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PuffsError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PuffsError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
