use serde::{Deserialize, Serialize};

use super::{Texture, TextureKind, Vertex};
use crate::gpu::{GpuBackend, MeshHandle};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<Texture>,
    #[serde(skip)]
    pub gpu: Option<MeshHandle>,
}

impl Mesh {
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Texture>,
    ) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            textures,
            gpu: None,
        }
    }

    pub fn num_elements(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Returns the first index that does not address a vertex of this mesh.
    pub fn find_invalid_index(&self) -> Option<u32> {
        let count = self.vertices.len();
        self.indices.iter().copied().find(|&i| i as usize >= count)
    }

    /// Shader sampler name for each texture, numbered per kind in texture order
    /// (`texture_diffuse1`, `texture_diffuse2`, `texture_specular1`, ...).
    pub fn sampler_names(&self) -> Vec<String> {
        let mut counters = [0u32; TextureKind::ALL.len()];
        self.textures
            .iter()
            .map(|texture| {
                let slot = TextureKind::ALL
                    .iter()
                    .position(|kind| *kind == texture.kind)
                    .unwrap_or_default();
                counters[slot] += 1;
                format!("{}{}", texture.kind.sampler_prefix(), counters[slot])
            })
            .collect()
    }

    pub fn is_bound(&self) -> bool {
        self.gpu.is_some()
    }

    /// One-time upload of the vertex and index buffers.
    pub(crate) fn setup<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.gpu.is_some() {
            return;
        }
        self.gpu = Some(backend.create_mesh_buffers(&self.name, &self.vertices, &self.indices));
    }

    pub(crate) fn release<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(handle) = self.gpu.take() {
            backend.release_mesh_buffers(handle);
        }
        for texture in &mut self.textures {
            texture.handle = None;
        }
    }
}

impl PartialEq for Mesh {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.vertices == other.vertices
            && self.indices == other.indices
            && self.textures == other.textures
    }
}
