use std::path::Path;
use std::sync::Arc;

use image::imageops::FilterType;
use image::RgbaImage;
use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use super::{GpuBackend, MeshHandle, TextureHandle};
use crate::error::{ModelError, Result};
use crate::model::{TextureKind, Vertex};

const PLACEHOLDER_SIZE: u32 = 64;

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    textures: SlotMap<TextureHandle, GpuTexture>,
    meshes: SlotMap<MeshHandle, GpuMesh>,
    placeholder: Option<TextureHandle>,
}

impl WgpuBackend {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self {
            device,
            queue,
            textures: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            placeholder: None,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(handle)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&GpuMesh> {
        self.meshes.get(handle)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    fn upload_rgba(&self, label: &str, rgba: RgbaImage, srgb: bool) -> GpuTexture {
        let (width, height) = rgba.dimensions();
        let mip_level_count = mip_level_count(width, height);
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // Mip chain is built on the CPU, one halving per level.
        let mut level_image = rgba;
        for mip_level in 0..mip_level_count {
            let (level_width, level_height) = level_image.dimensions();
            self.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                level_image.as_raw(),
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );

            if mip_level + 1 < mip_level_count {
                level_image = image::imageops::resize(
                    &level_image,
                    (level_width / 2).max(1),
                    (level_height / 2).max(1),
                    FilterType::Triangle,
                );
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        GpuTexture {
            texture,
            view,
            sampler,
        }
    }
}

impl GpuBackend for WgpuBackend {
    fn create_texture(
        &mut self,
        path: &Path,
        kind: TextureKind,
        srgb: bool,
    ) -> Result<TextureHandle> {
        let img = image::open(path).map_err(|source| ModelError::TextureNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let label = format!("{} {}", kind, path.display());
        let texture = self.upload_rgba(&label, img.to_rgba8(), srgb);
        log::debug!(
            "Uploaded {} ({}x{}, {} mips)",
            label,
            texture.texture.width(),
            texture.texture.height(),
            texture.texture.mip_level_count()
        );
        Ok(self.textures.insert(texture))
    }

    fn placeholder_texture(&mut self) -> TextureHandle {
        if let Some(handle) = self.placeholder {
            return handle;
        }
        let texture = self.upload_rgba(
            "Placeholder Texture",
            create_checkerboard_texture(PLACEHOLDER_SIZE),
            false,
        );
        let handle = self.textures.insert(texture);
        self.placeholder = Some(handle);
        handle
    }

    fn create_mesh_buffers(
        &mut self,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> MeshHandle {
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.meshes.insert(GpuMesh {
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
        })
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        // Shared between every model that hit a missing texture.
        if Some(handle) == self.placeholder {
            return;
        }
        if let Some(texture) = self.textures.remove(handle) {
            texture.texture.destroy();
        }
    }

    fn release_mesh_buffers(&mut self, handle: MeshHandle) {
        if let Some(mesh) = self.meshes.remove(handle) {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
    }
}

fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

fn create_checkerboard_texture(size: u32) -> RgbaImage {
    let square_size = (size / 8).max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        if ((x / square_size) + (y / square_size)) % 2 == 0 {
            image::Rgba([255, 0, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    })
}
