use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::{CursorGrabMode, Window};

use crate::config::Config;
use crate::gpu::WgpuBackend;
use crate::model::{Model, ModelLoader};
use crate::scene::Session;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.2,
    b: 0.3,
    a: 1.0,
};

/// A window with a wgpu surface, one loaded model and the camera session.
pub struct Viewer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    backend: WgpuBackend,
    model: Option<Model>,
    pub session: Session,
}

impl Viewer {
    pub fn new(window: Window, config: Config) -> Result<Self> {
        let window = Arc::new(window);
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("Failed to find an appropriate adapter"))?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Primary Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface is not supported by the adapter"))?;
        log::debug!("Selected surface format: {:?}", surface_format);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Ok(Self {
            window,
            surface,
            surface_config,
            backend: WgpuBackend::new(Arc::new(device), Arc::new(queue)),
            model: None,
            session: Session::new(config),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Loads and binds a model, replacing the current one.
    pub fn load_model(
        &mut self,
        loader: &ModelLoader,
        base_path: &Path,
        file_name: &str,
        gamma: bool,
    ) -> Result<()> {
        let model = loader
            .load(base_path, file_name, gamma, &mut self.backend)
            .with_context(|| {
                format!("Failed to load model {}", base_path.join(file_name).display())
            })?;

        log::info!(
            "{} ready: {} meshes, {} GPU textures",
            model.file_name,
            model.meshes.len(),
            self.backend.texture_count()
        );
        if let Some(mut previous) = self.model.replace(model) {
            previous.dispose(&mut self.backend);
        }
        Ok(())
    }

    pub fn set_cursor_captured(&self, captured: bool) {
        if captured {
            let grabbed = self
                .window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked));
            if let Err(e) = grabbed {
                log::warn!("Could not capture the cursor: {}", e);
            }
        } else if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Could not release the cursor: {}", e);
        }
        self.window.set_cursor_visible(!captured);
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(self.backend.device(), &self.surface_config);
        }
    }

    /// Clears the frame. Drawing the model is left to a future render pipeline.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .backend
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        self.backend.queue().submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Reconfigures the surface after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        self.surface.configure(self.backend.device(), &self.surface_config);
    }

    /// Releases the model's GPU resources.
    pub fn shutdown(&mut self) {
        if let Some(mut model) = self.model.take() {
            model.dispose(&mut self.backend);
            log::info!(
                "Released model {}; {} textures and {} meshes still allocated",
                model.file_name,
                self.backend.texture_count(),
                self.backend.mesh_count()
            );
        }
    }
}
