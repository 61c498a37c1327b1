//! Scene-import collaborator.
//!
//! Importers turn an asset file into a format-neutral [`Scene`]: a node tree
//! whose nodes reference meshes by index into one flat mesh array, plus a flat
//! material array. Structural gaps are reported through [`Scene::incomplete`]
//! rather than an error so the caller decides what an incomplete scene means.

mod gltf_importer;
mod obj_importer;

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

pub use gltf_importer::GltfImporter;
pub use obj_importer::ObjImporter;

/// Post-processing requested from an importer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    pub triangulate: bool,
    /// Produce texture coordinates with a top-left origin.
    pub flip_uvs: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: true,
        }
    }
}

pub trait SceneImporter: Send + Sync {
    /// Lower-case file extensions this importer understands.
    fn extensions(&self) -> &[&'static str];

    fn import(&self, path: &Path, options: ImportOptions) -> Result<Scene>;
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub root: Node,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
    pub incomplete: bool,
}

impl Scene {
    /// Number of mesh references reachable from the root, counting repeats.
    pub fn mesh_attachment_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            node.meshes.len() + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Node {
    pub name: String,
    pub meshes: Vec<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// One entry per UV channel; channel 0 is the only one consumed.
    pub tex_coords: Vec<Vec<[f32; 2]>>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    pub faces: Vec<Vec<u32>>,
    pub material_index: Option<usize>,
}

/// Texture slots as asset formats name them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Diffuse,
    Specular,
    Ambient,
    Emissive,
    Height,
    Normals,
}

#[derive(Clone, Debug, Default)]
pub struct SourceMaterial {
    pub name: String,
    textures: HashMap<MaterialSlot, Vec<String>>,
}

impl SourceMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: HashMap::new(),
        }
    }

    pub fn add_texture(&mut self, slot: MaterialSlot, relative_path: impl Into<String>) {
        self.textures.entry(slot).or_default().push(relative_path.into());
    }

    pub fn with_texture(mut self, slot: MaterialSlot, relative_path: impl Into<String>) -> Self {
        self.add_texture(slot, relative_path);
        self
    }

    pub fn texture_count(&self, slot: MaterialSlot) -> usize {
        self.textures.get(&slot).map_or(0, Vec::len)
    }

    /// File path of texture `index` in `slot`, relative to the model's directory.
    pub fn texture_path(&self, slot: MaterialSlot, index: usize) -> Option<&str> {
        self.textures.get(&slot)?.get(index).map(String::as_str)
    }
}

/// Splits a polygon into a triangle fan. Triangles pass through untouched,
/// points and lines yield nothing.
pub(crate) fn triangulate_fan(polygon: &[u32]) -> impl Iterator<Item = Vec<u32>> + '_ {
    (1..polygon.len().saturating_sub(1)).map(move |i| vec![polygon[0], polygon[i], polygon[i + 1]])
}
