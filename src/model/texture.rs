use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::gpu::TextureHandle;

/// Semantic role of a texture inside a mesh's material.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    pub const ALL: [TextureKind; 4] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Normal,
        TextureKind::Height,
    ];

    /// Prefix of the shader sampler uniforms for this kind, e.g. `texture_diffuse1`.
    pub fn sampler_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sampler_prefix())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Texture {
    pub kind: TextureKind,
    pub path: PathBuf,
    // Only meaningful for the process that bound it.
    #[serde(skip)]
    pub handle: Option<TextureHandle>,
}

impl Texture {
    pub fn new(kind: TextureKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            handle: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.path == other.path
    }
}
