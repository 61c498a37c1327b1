pub mod cache;
pub mod loader;
mod mesh;
mod process;
mod texture;
mod vertex;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gpu::GpuBackend;

pub use loader::{CachePolicy, LoadOptions, ModelLoader, TextureSlotMapping};
pub use mesh::Mesh;
pub use texture::{Texture, TextureKind};
pub use vertex::Vertex;

#[derive(Debug, Serialize, Deserialize)]
pub struct Model {
    pub base_path: PathBuf,
    pub file_name: String,
    pub cache_file_name: String,
    pub gamma_correction: bool,
    pub meshes: Vec<Mesh>,
    // Path -> first texture bound from it. Only used while binding.
    #[serde(skip)]
    textures_loaded: HashMap<PathBuf, Texture>,
}

impl Model {
    pub fn new(
        base_path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        gamma_correction: bool,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            base_path: base_path.into(),
            cache_file_name: cache::cache_file_name(&file_name),
            file_name,
            gamma_correction,
            meshes: Vec::new(),
            textures_loaded: HashMap::new(),
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.base_path.join(&self.file_name)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.base_path.join(&self.cache_file_name)
    }

    /// Moves the model to `base_path`. Texture paths under the old base
    /// directory follow it; any others are left as they are.
    pub fn rebase(&mut self, base_path: &Path) {
        let old_base = std::mem::replace(&mut self.base_path, base_path.to_path_buf());
        for texture in self.meshes.iter_mut().flat_map(|mesh| mesh.textures.iter_mut()) {
            if let Ok(relative) = texture.path.strip_prefix(&old_base) {
                texture.path = base_path.join(relative);
            }
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.vertices.len()).sum()
    }

    pub fn index_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.indices.len()).sum()
    }

    /// Distinct texture files referenced by any mesh.
    pub fn texture_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self
            .meshes
            .iter()
            .flat_map(|mesh| mesh.textures.iter().map(|texture| texture.path.as_path()))
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }

    // Calculate the bounding box over every mesh
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];

        for vertex in self.meshes.iter().flat_map(|mesh| &mesh.vertices) {
            for i in 0..3 {
                min[i] = min[i].min(vertex.position[i]);
                max[i] = max[i].max(vertex.position[i]);
            }
        }

        (min, max)
    }

    pub fn is_bound(&self) -> bool {
        self.meshes.iter().all(Mesh::is_bound)
    }

    /// Creates GPU resources for every mesh. Must run on the thread that owns
    /// the backend, after all meshes have been populated.
    ///
    /// Textures are deduplicated by path, so a file referenced by several
    /// meshes is uploaded once. A texture that cannot be loaded is replaced by
    /// the backend's placeholder and not retried.
    pub fn bind<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        for mesh in &mut self.meshes {
            for texture in &mut mesh.textures {
                if texture.handle.is_some() {
                    continue;
                }
                if let Some(loaded) = self.textures_loaded.get(&texture.path) {
                    texture.handle = loaded.handle;
                    continue;
                }

                let srgb = self.gamma_correction && texture.kind == TextureKind::Diffuse;
                let handle = match backend.create_texture(&texture.path, texture.kind, srgb) {
                    Ok(handle) => handle,
                    Err(e) => {
                        log::warn!("{}, using placeholder texture", e);
                        backend.placeholder_texture()
                    }
                };
                texture.handle = Some(handle);
                self.textures_loaded.insert(texture.path.clone(), texture.clone());
            }
            mesh.setup(backend);
        }

        log::debug!(
            "Bound {} meshes and {} textures for {}",
            self.meshes.len(),
            self.textures_loaded.len(),
            self.file_name
        );
    }

    /// Releases every GPU resource held by this model.
    pub fn dispose<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        for mesh in &mut self.meshes {
            mesh.release(backend);
        }
        for (_, texture) in self.textures_loaded.drain() {
            if let Some(handle) = texture.handle {
                backend.release_texture(handle);
            }
        }
    }
}
