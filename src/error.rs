use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while importing, caching or binding a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model source not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("unsupported model format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("import of {} is incomplete: {reason}", .path.display())]
    ImportIncomplete { path: PathBuf, reason: String },

    #[error("model cache {} is corrupt: {reason}", .path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("texture {} could not be loaded: {source}", .path.display())]
    TextureNotFound {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write model cache {}: {reason}", .path.display())]
    CacheWriteFailed { path: PathBuf, reason: String },
}

impl ModelError {
    pub(crate) fn incomplete(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ImportIncomplete {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CacheCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CacheWriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
