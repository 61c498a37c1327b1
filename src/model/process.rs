use std::path::Path;
use std::sync::mpsc::{self, Sender};

use super::{Mesh, Texture, TextureKind, TextureSlotMapping, Vertex};
use crate::error::{ModelError, Result};
use crate::import::{Node, Scene, SourceMesh};

/// Walks the scene graph and extracts one [`Mesh`] per mesh attachment.
///
/// Every attachment and every child node is its own unit of work on a rayon
/// scope, so the walk is done when the scope returns. Meshes arrive in
/// completion order.
pub(crate) fn process_scene(
    scene: &Scene,
    base_path: &Path,
    mapping: TextureSlotMapping,
    source_path: &Path,
) -> Result<Vec<Mesh>> {
    let walk = SceneWalk {
        scene,
        base_path,
        mapping,
        source_path,
    };

    let (sender, receiver) = mpsc::channel();
    rayon::scope(|scope| walk.visit(scope, &scene.root, sender));

    // Every sender has been dropped with its unit, so this drains and ends.
    receiver.into_iter().collect()
}

struct SceneWalk<'a> {
    scene: &'a Scene,
    base_path: &'a Path,
    mapping: TextureSlotMapping,
    source_path: &'a Path,
}

impl<'a> SceneWalk<'a> {
    fn visit<'s>(&'s self, scope: &rayon::Scope<'s>, node: &'s Node, sender: Sender<Result<Mesh>>) {
        for &mesh_index in &node.meshes {
            let sender = sender.clone();
            scope.spawn(move |_| {
                let _ = sender.send(self.extract(mesh_index));
            });
        }
        for child in &node.children {
            let sender = sender.clone();
            scope.spawn(move |scope| self.visit(scope, child, sender));
        }
    }

    fn extract(&self, mesh_index: usize) -> Result<Mesh> {
        let source = self.scene.meshes.get(mesh_index).ok_or_else(|| {
            ModelError::incomplete(
                self.source_path,
                format!(
                    "node references mesh {} but the scene has {}",
                    mesh_index,
                    self.scene.meshes.len()
                ),
            )
        })?;

        let vertices = build_vertices(source);
        let indices = self.build_indices(source);
        let textures = self.collect_textures(source);
        let mesh = Mesh::new(source.name.clone(), vertices, indices, textures);

        if let Some(index) = mesh.find_invalid_index() {
            return Err(ModelError::incomplete(
                self.source_path,
                format!(
                    "mesh {:?} references vertex {} of {}",
                    mesh.name,
                    index,
                    mesh.vertices.len()
                ),
            ));
        }

        log::debug!(
            "Extracted mesh {:?}: {} vertices, {} indices, {} textures",
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len(),
            mesh.textures.len()
        );
        Ok(mesh)
    }

    fn build_indices(&self, source: &SourceMesh) -> Vec<u32> {
        let mut indices = Vec::with_capacity(source.faces.len() * 3);
        let mut skipped = 0usize;
        for face in &source.faces {
            if face.len() == 3 {
                indices.extend_from_slice(face);
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            log::warn!(
                "Skipped {} non-triangle faces in mesh {:?} of {}",
                skipped,
                source.name,
                self.source_path.display()
            );
        }
        indices
    }

    fn collect_textures(&self, source: &SourceMesh) -> Vec<Texture> {
        let Some(material_index) = source.material_index else {
            return Vec::new();
        };
        let Some(material) = self.scene.materials.get(material_index) else {
            log::warn!(
                "Mesh {:?} references missing material {}",
                source.name,
                material_index
            );
            return Vec::new();
        };

        let mut textures = Vec::new();
        for kind in TextureKind::ALL {
            let slot = self.mapping.slot_for(kind);
            for i in 0..material.texture_count(slot) {
                if let Some(relative) = material.texture_path(slot, i) {
                    textures.push(Texture::new(kind, self.base_path.join(relative)));
                }
            }
        }
        textures
    }
}

fn build_vertices(source: &SourceMesh) -> Vec<Vertex> {
    let uvs = source.tex_coords.first();
    source
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: source.normals.get(i).copied().unwrap_or_default(),
            tex_coords: uvs.and_then(|channel| channel.get(i)).copied().unwrap_or_default(),
            tangent: source.tangents.get(i).copied().unwrap_or_default(),
            bitangent: source.bitangents.get(i).copied().unwrap_or_default(),
        })
        .collect()
}
