use std::path::Path;

use super::{cache, process, Model, TextureKind};
use crate::error::{ModelError, Result};
use crate::gpu::GpuBackend;
use crate::import::{GltfImporter, ImportOptions, MaterialSlot, ObjImporter, SceneImporter};

/// When an existing snapshot may stand in for the source asset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Any snapshot at the derived path is used as-is.
    #[default]
    TrustExisting,
    /// The snapshot is used only if the source's size and modification time
    /// match the ones recorded when it was written.
    VerifySource,
}

/// Which material slot feeds each texture kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextureSlotMapping {
    pub diffuse: MaterialSlot,
    pub specular: MaterialSlot,
    pub normal: MaterialSlot,
    pub height: MaterialSlot,
}

impl TextureSlotMapping {
    /// Normal maps read from the height slot and height maps from the ambient
    /// slot. This is where OBJ exporters tend to put `map_Bump`, and existing
    /// assets and shaders depend on it.
    pub const fn legacy() -> Self {
        Self {
            diffuse: MaterialSlot::Diffuse,
            specular: MaterialSlot::Specular,
            normal: MaterialSlot::Height,
            height: MaterialSlot::Ambient,
        }
    }

    pub const fn conventional() -> Self {
        Self {
            diffuse: MaterialSlot::Diffuse,
            specular: MaterialSlot::Specular,
            normal: MaterialSlot::Normals,
            height: MaterialSlot::Height,
        }
    }

    pub fn slot_for(&self, kind: TextureKind) -> MaterialSlot {
        match kind {
            TextureKind::Diffuse => self.diffuse,
            TextureKind::Specular => self.specular,
            TextureKind::Normal => self.normal,
            TextureKind::Height => self.height,
        }
    }
}

impl Default for TextureSlotMapping {
    fn default() -> Self {
        Self::legacy()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub cache_policy: CachePolicy,
    /// Re-import instead of failing when the snapshot cannot be decoded.
    pub reimport_on_corrupt_cache: bool,
    pub import: ImportOptions,
    pub slot_mapping: TextureSlotMapping,
}

/// Loads models from their cache snapshot or, failing that, from the source
/// asset through one of the registered importers.
pub struct ModelLoader {
    importers: Vec<Box<dyn SceneImporter>>,
    options: LoadOptions,
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader {
    /// A loader for glTF and OBJ assets with default options.
    pub fn new() -> Self {
        Self {
            importers: vec![Box::new(GltfImporter), Box::new(ObjImporter)],
            options: LoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers another importer. It is consulted before the built-in ones.
    pub fn with_importer(mut self, importer: impl SceneImporter + 'static) -> Self {
        self.importers.insert(0, Box::new(importer));
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Loads `base_path/file_name` and binds it to `backend`.
    pub fn load<B: GpuBackend + ?Sized>(
        &self,
        base_path: impl AsRef<Path>,
        file_name: &str,
        gamma_correction: bool,
        backend: &mut B,
    ) -> Result<Model> {
        let (mut model, from_cache) =
            self.load_data(base_path.as_ref(), file_name, gamma_correction)?;
        model.bind(backend);
        if !from_cache {
            write_cache(&model);
        }
        Ok(model)
    }

    /// Same as [`ModelLoader::load`] without creating any GPU resources.
    pub fn load_unbound(
        &self,
        base_path: impl AsRef<Path>,
        file_name: &str,
        gamma_correction: bool,
    ) -> Result<Model> {
        let (model, from_cache) =
            self.load_data(base_path.as_ref(), file_name, gamma_correction)?;
        if !from_cache {
            write_cache(&model);
        }
        Ok(model)
    }

    fn load_data(
        &self,
        base_path: &Path,
        file_name: &str,
        gamma_correction: bool,
    ) -> Result<(Model, bool)> {
        let mut model = Model::new(base_path, file_name, gamma_correction);
        let cache_path = model.cache_path();

        if let Some(mut cached) = self.load_cached(&model, &cache_path)? {
            if cached.base_path != base_path {
                log::info!(
                    "Model cache {} was written in {}",
                    cache_path.display(),
                    cached.base_path.display()
                );
                cached.rebase(base_path);
            }
            cached.gamma_correction = gamma_correction;
            return Ok((cached, true));
        }

        let source_path = model.source_path();
        if !source_path.exists() {
            return Err(ModelError::SourceNotFound { path: source_path });
        }

        let importer = self.importer_for(&source_path)?;
        log::info!("Importing {}", source_path.display());
        let scene = importer.import(&source_path, self.options.import)?;
        if scene.incomplete {
            return Err(ModelError::incomplete(
                &source_path,
                "importer reported an incomplete scene",
            ));
        }

        model.meshes =
            process::process_scene(&scene, base_path, self.options.slot_mapping, &source_path)?;
        log::info!(
            "Imported {}: {} meshes, {} vertices, {} indices",
            file_name,
            model.meshes.len(),
            model.vertex_count(),
            model.index_count()
        );
        Ok((model, false))
    }

    // Ok(None) means the snapshot should not be used and the source imported instead.
    fn load_cached(&self, model: &Model, cache_path: &Path) -> Result<Option<Model>> {
        if !cache_path.exists() {
            log::info!("No model cache at {}", cache_path.display());
            return Ok(None);
        }

        if self.options.cache_policy == CachePolicy::VerifySource {
            let recorded = match cache::read_stamp(cache_path) {
                Ok(stamp) => stamp,
                Err(e) => return self.corrupt_cache(e),
            };
            let current = cache::SourceStamp::of(&model.source_path());
            if recorded.is_none() || recorded != current {
                log::info!("Model cache {} is stale, re-importing", cache_path.display());
                return Ok(None);
            }
        }

        match cache::load(cache_path) {
            Ok(cached) => Ok(Some(cached)),
            Err(e) => self.corrupt_cache(e),
        }
    }

    fn corrupt_cache(&self, error: ModelError) -> Result<Option<Model>> {
        if self.options.reimport_on_corrupt_cache {
            log::warn!("{}, re-importing", error);
            Ok(None)
        } else {
            Err(error)
        }
    }

    fn importer_for(&self, path: &Path) -> Result<&dyn SceneImporter> {
        let extension = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("")
            .to_lowercase();

        self.importers
            .iter()
            .find(|importer| importer.extensions().contains(&extension.as_str()))
            .map(|importer| &**importer)
            .ok_or(ModelError::UnsupportedFormat { extension })
    }
}

fn write_cache(model: &Model) {
    if let Err(e) = cache::save(model) {
        log::warn!("{}", e);
    }
}
