use std::ops::Range;
use std::path::Path;

use glam::Vec3;

use super::{ImportOptions, MaterialSlot, Node, Scene, SceneImporter, SourceMaterial, SourceMesh};
use crate::error::{ModelError, Result};

/// glTF 2.0 (`.gltf` and `.glb`). Every primitive becomes its own mesh.
#[derive(Debug, Default)]
pub struct GltfImporter;

impl SceneImporter for GltfImporter {
    fn extensions(&self) -> &[&'static str] {
        &["gltf", "glb"]
    }

    fn import(&self, path: &Path, options: ImportOptions) -> Result<Scene> {
        let gltf::Gltf { document, blob } =
            gltf::Gltf::open(path).map_err(|e| import_error(path, e))?;
        // Images are left alone here; textures are decoded when the model is bound.
        let buffers = gltf::import_buffers(&document, path.parent(), blob)
            .map_err(|e| import_error(path, e))?;

        let mut scene = Scene::default();
        let mut primitive_ranges: Vec<Range<usize>> = Vec::with_capacity(document.meshes().len());

        for mesh in document.meshes() {
            let start = scene.meshes.len();
            for primitive in mesh.primitives() {
                match read_primitive(&mesh, &primitive, &buffers, options) {
                    Some(source_mesh) => scene.meshes.push(source_mesh),
                    None if is_triangle_mode(primitive.mode()) => {
                        log::warn!(
                            "Primitive {} of mesh {:?} in {} has no positions",
                            primitive.index(),
                            mesh.name(),
                            path.display()
                        );
                        scene.incomplete = true;
                    }
                    None => log::debug!(
                        "Dropping {:?} primitive {} of mesh {:?}",
                        primitive.mode(),
                        primitive.index(),
                        mesh.name()
                    ),
                }
            }
            primitive_ranges.push(start..scene.meshes.len());
        }

        scene.materials = document.materials().map(read_material).collect();

        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(gltf_scene) => {
                let mut walk = NodeWalk {
                    primitive_ranges: &primitive_ranges,
                    ancestors: Vec::new(),
                    cyclic: false,
                };
                scene.root = Node::new(gltf_scene.name().unwrap_or("root"));
                scene.root.children =
                    gltf_scene.nodes().filter_map(|node| walk.convert(node)).collect();
                if walk.cyclic {
                    log::warn!("{} has a cycle in its node hierarchy", path.display());
                    scene.incomplete = true;
                }
            }
            None => {
                log::warn!("{} contains no scene", path.display());
                scene.incomplete = true;
            }
        }

        Ok(scene)
    }
}

fn import_error(path: &Path, error: gltf::Error) -> ModelError {
    match error {
        gltf::Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
            ModelError::SourceNotFound {
                path: path.to_path_buf(),
            }
        }
        other => ModelError::incomplete(path, other.to_string()),
    }
}

fn is_triangle_mode(mode: gltf::mesh::Mode) -> bool {
    matches!(
        mode,
        gltf::mesh::Mode::Triangles
            | gltf::mesh::Mode::TriangleStrip
            | gltf::mesh::Mode::TriangleFan
    )
}

struct NodeWalk<'a> {
    primitive_ranges: &'a [Range<usize>],
    ancestors: Vec<usize>,
    cyclic: bool,
}

impl NodeWalk<'_> {
    // A node that is its own ancestor is dropped and flags the walk.
    fn convert(&mut self, node: gltf::Node) -> Option<Node> {
        if self.ancestors.contains(&node.index()) {
            self.cyclic = true;
            return None;
        }

        self.ancestors.push(node.index());
        let children = node.children().filter_map(|child| self.convert(child)).collect();
        self.ancestors.pop();

        Some(Node {
            name: node.name().unwrap_or_default().to_string(),
            meshes: node
                .mesh()
                .and_then(|mesh| self.primitive_ranges.get(mesh.index()))
                .map(|range| range.clone().collect())
                .unwrap_or_default(),
            children,
        })
    }
}

fn read_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    options: ImportOptions,
) -> Option<SourceMesh> {
    if !is_triangle_mode(primitive.mode()) {
        return None;
    }

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();

    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_default();

    // glTF already stores UVs with a top-left origin.
    let tex_coords: Vec<Vec<[f32; 2]>> = (0..)
        .map_while(|set| reader.read_tex_coords(set))
        .map(|iter| {
            iter.into_f32()
                .map(|[u, v]| if options.flip_uvs { [u, v] } else { [u, 1.0 - v] })
                .collect()
        })
        .collect();

    let (tangents, bitangents): (Vec<[f32; 3]>, Vec<[f32; 3]>) = match reader.read_tangents() {
        Some(iter) => iter
            .enumerate()
            .map(|(i, [x, y, z, w])| {
                let tangent = Vec3::new(x, y, z);
                let normal = normals.get(i).copied().map(Vec3::from).unwrap_or(Vec3::ZERO);
                (tangent.to_array(), (normal.cross(tangent) * w).to_array())
            })
            .unzip(),
        None => (Vec::new(), Vec::new()),
    };

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let faces = match primitive.mode() {
        gltf::mesh::Mode::TriangleStrip => strip_faces(&indices),
        gltf::mesh::Mode::TriangleFan => super::triangulate_fan(&indices).collect(),
        _ => indices.chunks_exact(3).map(<[u32]>::to_vec).collect(),
    };

    let name = match mesh.primitives().len() {
        1 => mesh.name().unwrap_or_default().to_string(),
        _ => format!("{}#{}", mesh.name().unwrap_or_default(), primitive.index()),
    };

    Some(SourceMesh {
        name,
        positions,
        normals,
        tex_coords,
        tangents,
        bitangents,
        faces,
        material_index: primitive.material().index(),
    })
}

// Odd triangles of a strip are flipped to keep a consistent winding.
fn strip_faces(indices: &[u32]) -> Vec<Vec<u32>> {
    indices
        .windows(3)
        .enumerate()
        .map(|(i, w)| if i % 2 == 0 { vec![w[0], w[1], w[2]] } else { vec![w[1], w[0], w[2]] })
        .collect()
}

fn read_material(material: gltf::Material) -> SourceMaterial {
    let mut source = SourceMaterial::new(material.name().unwrap_or_default());
    let pbr = material.pbr_metallic_roughness();

    let slots = [
        (MaterialSlot::Diffuse, pbr.base_color_texture().map(|info| info.texture())),
        (MaterialSlot::Specular, pbr.metallic_roughness_texture().map(|info| info.texture())),
        (MaterialSlot::Normals, material.normal_texture().map(|normal| normal.texture())),
        (MaterialSlot::Ambient, material.occlusion_texture().map(|occlusion| occlusion.texture())),
        (MaterialSlot::Emissive, material.emissive_texture().map(|info| info.texture())),
    ];

    for (slot, texture) in slots {
        let Some(texture) = texture else { continue };
        match texture.source().source() {
            gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                match urlencoding::decode(uri) {
                    Ok(decoded) => source.add_texture(slot, decoded),
                    Err(e) => log::warn!("Skipping image {:?} with a malformed URI: {}", uri, e),
                }
            }
            _ => log::warn!(
                "Skipping embedded image {} of material {:?}; only external textures are supported",
                texture.source().index(),
                material.name()
            ),
        }
    }

    source
}
