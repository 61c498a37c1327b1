//! GPU resource collaborator.
//!
//! The model code only ever talks to a [`GpuBackend`]; it never touches wgpu
//! directly. Resource creation must happen on the thread that owns the device,
//! so a backend is handed around by `&mut` and never shared with the import
//! workers.

mod wgpu_backend;

use std::path::Path;

use crate::error::Result;
use crate::model::{TextureKind, Vertex};

pub use wgpu_backend::{GpuMesh, GpuTexture, WgpuBackend};

slotmap::new_key_type! {
    /// Identifies a texture owned by a backend.
    pub struct TextureHandle;

    /// Identifies the vertex/index buffer pair of one mesh.
    pub struct MeshHandle;
}

pub trait GpuBackend {
    /// Reads `path` from disk and uploads it with a full mip chain.
    ///
    /// `srgb` selects an sRGB storage format, used for gamma-corrected colour maps.
    fn create_texture(
        &mut self,
        path: &Path,
        kind: TextureKind,
        srgb: bool,
    ) -> Result<TextureHandle>;

    /// A shared stand-in for textures that could not be loaded.
    fn placeholder_texture(&mut self) -> TextureHandle;

    fn create_mesh_buffers(
        &mut self,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> MeshHandle;

    fn release_texture(&mut self, handle: TextureHandle);

    fn release_mesh_buffers(&mut self, handle: MeshHandle);
}
