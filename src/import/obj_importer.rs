use std::path::Path;

use super::{ImportOptions, MaterialSlot, Node, Scene, SceneImporter, SourceMaterial, SourceMesh};
use crate::error::{ModelError, Result};

/// Wavefront OBJ with an optional MTL library. Every object or group becomes
/// one child of the root node holding a single mesh.
#[derive(Debug, Default)]
pub struct ObjImporter;

impl SceneImporter for ObjImporter {
    fn extensions(&self) -> &[&'static str] {
        &["obj"]
    }

    fn import(&self, path: &Path, options: ImportOptions) -> Result<Scene> {
        if !path.exists() {
            return Err(ModelError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        let load_options = tobj::LoadOptions {
            triangulate: options.triangulate,
            single_index: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };

        let (models, materials) = tobj::load_obj(path, &load_options)
            .map_err(|e| ModelError::incomplete(path, e.to_string()))?;

        let materials = match materials {
            Ok(materials) => materials,
            Err(e) => {
                log::warn!("No usable material library for {}: {}", path.display(), e);
                Vec::new()
            }
        };

        let mut scene = Scene {
            root: Node::new(path.file_name().and_then(|n| n.to_str()).unwrap_or("root")),
            ..Default::default()
        };

        for model in models {
            let mut node = Node::new(model.name.clone());
            node.meshes.push(scene.meshes.len());
            scene.root.children.push(node);
            scene.meshes.push(convert_mesh(model, options));
        }

        scene.materials = materials.into_iter().map(convert_material).collect();
        Ok(scene)
    }
}

fn convert_mesh(model: tobj::Model, options: ImportOptions) -> SourceMesh {
    let mesh = model.mesh;

    let positions = mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect();
    let normals = mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect();

    let tex_coords = if mesh.texcoords.is_empty() {
        Vec::new()
    } else {
        // OBJ puts the UV origin at the bottom left.
        vec![mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| if options.flip_uvs { [t[0], 1.0 - t[1]] } else { [t[0], t[1]] })
            .collect()]
    };

    // Without triangulation tobj reports the arity of each face; an empty list
    // means every face is a triangle.
    let faces = if mesh.face_arities.is_empty() {
        mesh.indices.chunks_exact(3).map(<[u32]>::to_vec).collect()
    } else {
        let mut faces = Vec::with_capacity(mesh.face_arities.len());
        let mut start = 0usize;
        for &arity in &mesh.face_arities {
            let end = start + arity as usize;
            faces.push(mesh.indices[start..end].to_vec());
            start = end;
        }
        faces
    };

    SourceMesh {
        name: model.name,
        positions,
        normals,
        tex_coords,
        tangents: Vec::new(),
        bitangents: Vec::new(),
        faces,
        material_index: mesh.material_id,
    }
}

fn convert_material(material: tobj::Material) -> SourceMaterial {
    let mut source = SourceMaterial::new(material.name);
    let slots = [
        (MaterialSlot::Diffuse, material.diffuse_texture),
        (MaterialSlot::Specular, material.specular_texture),
        // map_Bump lands in the height slot, the same place other importers put it.
        (MaterialSlot::Height, material.normal_texture),
        (MaterialSlot::Ambient, material.ambient_texture),
    ];
    for (slot, texture) in slots {
        if let Some(texture) = texture.filter(|t| !t.is_empty()) {
            source.add_texture(slot, texture);
        }
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    const QUAD_OBJ: &str = "\
mtllib quad.mtl
o Quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
usemtl brick
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    const QUAD_MTL: &str = "\
newmtl brick
Kd 1.0 1.0 1.0
map_Kd brick_diffuse.png
map_Ks brick_specular.png
map_Bump brick_normal.png
";

    #[test]
    fn test_import_quad_with_materials() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("quad.obj").write_str(QUAD_OBJ).unwrap();
        temp.child("quad.mtl").write_str(QUAD_MTL).unwrap();

        let scene = ObjImporter
            .import(&temp.path().join("quad.obj"), ImportOptions::default())
            .unwrap();

        assert!(!scene.incomplete);
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.root.children.len(), 1);
        assert_eq!(scene.mesh_attachment_count(), 1);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.faces.len(), 2, "quad should be split into two triangles");
        assert!(mesh.faces.iter().all(|face| face.len() == 3));
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.normals.len(), 4);

        // v is flipped to a top-left origin
        let uvs = &mesh.tex_coords[0];
        assert!(uvs.contains(&[0.0, 1.0]));
        assert!(uvs.contains(&[1.0, 0.0]));

        let material = &scene.materials[mesh.material_index.unwrap()];
        assert_eq!(material.texture_path(MaterialSlot::Diffuse, 0), Some("brick_diffuse.png"));
        assert_eq!(material.texture_path(MaterialSlot::Specular, 0), Some("brick_specular.png"));
        assert_eq!(material.texture_path(MaterialSlot::Height, 0), Some("brick_normal.png"));
        assert_eq!(material.texture_count(MaterialSlot::Ambient), 0);
    }

    #[test]
    fn test_missing_material_library_is_not_fatal() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("quad.obj").write_str(QUAD_OBJ).unwrap();

        let scene = ObjImporter
            .import(&temp.path().join("quad.obj"), ImportOptions::default())
            .unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert!(scene.materials.is_empty());
    }

    #[test]
    fn test_polygons_kept_without_triangulation() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("quad.obj").write_str(QUAD_OBJ).unwrap();

        let options = ImportOptions {
            triangulate: false,
            flip_uvs: false,
        };
        let scene = ObjImporter.import(&temp.path().join("quad.obj"), options).unwrap();
        assert_eq!(scene.meshes[0].faces, vec![vec![0, 1, 2, 3]]);
        assert!(scene.meshes[0].tex_coords[0].contains(&[0.0, 0.0]));
    }

    #[test]
    fn test_missing_source() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = ObjImporter.import(&temp.path().join("nope.obj"), ImportOptions::default());
        assert!(matches!(result, Err(ModelError::SourceNotFound { .. })));
    }
}
