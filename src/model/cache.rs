//! Binary snapshots of processed models.
//!
//! A snapshot sits next to the source asset and holds everything needed to
//! rebuild a [`Model`] without running the importer: meshes, vertices,
//! indices and texture metadata. GPU handles are never written; a decoded
//! model always has to be bound again.
//!
//! Layout: a small header (magic, format version, source stamp) followed by
//! the bincode encoding of the model. The format is only meant to round-trip
//! within one build of this crate.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use super::Model;
use crate::error::{ModelError, Result};

pub const CACHE_EXTENSION: &str = "cache";

const MAGIC: [u8; 4] = *b"MDLC";
const FORMAT_VERSION: u32 = 1;
const DECODE_LIMIT: usize = 1 << 30;

/// Size and modification time of a source asset when its snapshot was written.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStamp {
    pub len: u64,
    pub modified_secs: u64,
    pub modified_nanos: u32,
}

impl SourceStamp {
    pub fn of(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        let modified = metadata.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
        Some(Self {
            len: metadata.len(),
            modified_secs: modified.as_secs(),
            modified_nanos: modified.subsec_nanos(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    magic: [u8; 4],
    version: u32,
    source: Option<SourceStamp>,
}

/// `backpack.obj` -> `backpack.cache`
pub fn cache_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .with_extension(CACHE_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

/// Writes `model` to its cache path, stamped with the current state of its source.
pub fn save(model: &Model) -> Result<()> {
    let path = model.cache_path();
    let header = Header {
        magic: MAGIC,
        version: FORMAT_VERSION,
        source: SourceStamp::of(&model.source_path()),
    };

    // Write beside the target and rename so readers never see a partial file.
    let partial = path.with_extension(format!("{}.partial", CACHE_EXTENSION));
    let write = || -> std::result::Result<(), String> {
        let file = File::create(&partial).map_err(|e| e.to_string())?;
        let mut writer = BufWriter::new(file);
        let config = bincode::config::standard();
        bincode::serde::encode_into_std_write(&header, &mut writer, config)
            .map_err(|e| e.to_string())?;
        bincode::serde::encode_into_std_write(model, &mut writer, config)
            .map_err(|e| e.to_string())?;
        writer.flush().map_err(|e| e.to_string())?;
        fs::rename(&partial, &path).map_err(|e| e.to_string())
    };

    write().map_err(|reason| {
        let _ = fs::remove_file(&partial);
        ModelError::write_failed(&path, reason)
    })?;

    log::info!("Wrote model cache {}", path.display());
    Ok(())
}

/// Decodes the snapshot at `path`. The returned model has no GPU resources.
pub fn load(path: &Path) -> Result<Model> {
    let metadata = fs::metadata(path).map_err(|e| ModelError::corrupt(path, e))?;
    if metadata.len() > DECODE_LIMIT as u64 {
        return Err(ModelError::corrupt(
            path,
            format!("{} bytes is larger than any snapshot", metadata.len()),
        ));
    }

    let bytes = fs::read(path).map_err(|e| ModelError::corrupt(path, e))?;
    let (_, header_len) = decode_header(path, &bytes)?;
    let (model, _): (Model, usize) =
        bincode::serde::decode_from_slice(&bytes[header_len..], decode_config())
            .map_err(|e| ModelError::corrupt(path, e))?;

    for mesh in &model.meshes {
        if let Some(index) = mesh.find_invalid_index() {
            return Err(ModelError::corrupt(
                path,
                format!(
                    "mesh {:?} references vertex {} of {}",
                    mesh.name,
                    index,
                    mesh.vertices.len()
                ),
            ));
        }
    }

    log::info!("Loaded model {} from cache {}", model.file_name, path.display());
    Ok(model)
}

/// Source stamp recorded in the snapshot at `path`, without decoding the model.
pub fn read_stamp(path: &Path) -> Result<Option<SourceStamp>> {
    let mut reader = File::open(path)
        .map(BufReader::new)
        .map_err(|e| ModelError::corrupt(path, e))?;
    let header: Header = bincode::serde::decode_from_std_read(&mut reader, decode_config())
        .map_err(|e| ModelError::corrupt(path, e))?;
    Ok(check_header(path, header)?.source)
}

// Length prefixes past the limit fail the decode before anything is allocated.
fn decode_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<DECODE_LIMIT>()
}

fn decode_header(path: &Path, bytes: &[u8]) -> Result<(Header, usize)> {
    let (header, len): (Header, usize) =
        bincode::serde::decode_from_slice(bytes, decode_config())
            .map_err(|e| ModelError::corrupt(path, e))?;
    Ok((check_header(path, header)?, len))
}

fn check_header(path: &Path, header: Header) -> Result<Header> {
    if header.magic != MAGIC {
        return Err(ModelError::corrupt(path, "not a model cache"));
    }
    if header.version != FORMAT_VERSION {
        return Err(ModelError::corrupt(
            path,
            format!("format version {} (expected {})", header.version, FORMAT_VERSION),
        ));
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mesh, Texture, TextureKind, Vertex};
    use assert_fs::prelude::*;

    fn sample_model(base: &Path) -> Model {
        let mut model = Model::new(base, "crate.obj", true);
        let vertices = vec![
            Vertex {
                position: [0.0, 0.0, 0.0],
                normal: [0.0, 0.0, 1.0],
                tex_coords: [0.0, 0.0],
                tangent: [1.0, 0.0, 0.0],
                bitangent: [0.0, 1.0, 0.0],
            },
            Vertex {
                position: [1.0, 0.0, 0.0],
                tex_coords: [1.0, 0.0],
                ..Default::default()
            },
            Vertex {
                position: [0.0, 1.0, 0.0],
                tex_coords: [0.0, 1.0],
                ..Default::default()
            },
        ];
        model.meshes.push(Mesh::new(
            "body",
            vertices,
            vec![0, 1, 2],
            vec![
                Texture::new(TextureKind::Diffuse, base.join("crate_diffuse.png")),
                Texture::new(TextureKind::Specular, base.join("crate_specular.png")),
            ],
        ));
        model.meshes.push(Mesh::new("empty", vec![], vec![], vec![]));
        model
    }

    #[test]
    fn test_cache_file_name() {
        assert_eq!(cache_file_name("backpack.obj"), "backpack.cache");
        assert_eq!(cache_file_name("scene.v2.gltf"), "scene.v2.cache");
        assert_eq!(cache_file_name("noext"), "noext.cache");
    }

    #[test]
    fn test_round_trip() {
        let temp = assert_fs::TempDir::new().unwrap();
        let model = sample_model(temp.path());

        save(&model).unwrap();
        assert!(temp.child("crate.cache").path().exists());
        assert!(!temp.child("crate.cache.partial").path().exists());

        let loaded = load(&model.cache_path()).unwrap();
        assert_eq!(loaded.meshes, model.meshes);
        assert_eq!(loaded.file_name, "crate.obj");
        assert_eq!(loaded.cache_file_name, "crate.cache");
        assert!(loaded.gamma_correction);
        assert!(loaded.meshes.iter().all(|mesh| !mesh.is_bound()));
        assert!(loaded.meshes[0].textures.iter().all(|t| !t.is_bound()));
    }

    #[test]
    fn test_missing_cache_is_corrupt() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = load(&temp.path().join("nothing.cache"));
        assert!(matches!(result, Err(ModelError::CacheCorrupt { .. })));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("garbage.cache");
        file.write_binary(b"definitely not a snapshot").unwrap();

        let result = load(file.path());
        assert!(matches!(result, Err(ModelError::CacheCorrupt { .. })));
    }

    #[test]
    fn test_truncated_is_corrupt() {
        let temp = assert_fs::TempDir::new().unwrap();
        let model = sample_model(temp.path());
        save(&model).unwrap();

        let bytes = fs::read(model.cache_path()).unwrap();
        fs::write(model.cache_path(), &bytes[..bytes.len() / 2]).unwrap();

        let result = load(&model.cache_path());
        assert!(matches!(result, Err(ModelError::CacheCorrupt { .. })));
    }

    #[test]
    fn test_oversized_length_prefix_is_corrupt() {
        let temp = assert_fs::TempDir::new().unwrap();
        let header = Header {
            magic: MAGIC,
            version: FORMAT_VERSION,
            source: None,
        };
        let mut bytes =
            bincode::serde::encode_to_vec(&header, bincode::config::standard()).unwrap();
        // Varint marker for a u64 length, then a length no file could back.
        bytes.push(253);
        bytes.extend_from_slice(&(u64::MAX / 2).to_le_bytes());
        let file = temp.child("huge.cache");
        file.write_binary(&bytes).unwrap();

        let result = load(file.path());
        assert!(matches!(result, Err(ModelError::CacheCorrupt { .. })));
    }

    #[test]
    fn test_stamp_recorded_when_source_exists() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("crate.obj").write_str("o crate\n").unwrap();
        let model = sample_model(temp.path());
        save(&model).unwrap();

        let stamp = read_stamp(&model.cache_path()).unwrap();
        assert_eq!(stamp, SourceStamp::of(&model.source_path()));
        assert_eq!(stamp.map(|s| s.len), Some(8));
    }

    #[test]
    fn test_write_failure() {
        let temp = assert_fs::TempDir::new().unwrap();
        let model = sample_model(&temp.path().join("does/not/exist"));

        let result = save(&model);
        assert!(matches!(result, Err(ModelError::CacheWriteFailed { .. })));
    }
}
