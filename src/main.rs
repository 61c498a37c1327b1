use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::WindowBuilder,
};

use wgpu_model_viewer::model::{
    cache, CachePolicy, LoadOptions, Model, ModelLoader, TextureSlotMapping,
};
use wgpu_model_viewer::scene::KeyAction;
use wgpu_model_viewer::{Config, Viewer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a model (or reuse its cache) without opening a window
    Import {
        /// Directory holding the model and its textures
        base_path: PathBuf,
        /// Model file name inside the base directory
        file_name: String,
        /// Treat diffuse textures as sRGB
        #[arg(long)]
        gamma: bool,
        /// Re-import when the source changed since the cache was written
        #[arg(long)]
        verify_source: bool,
        /// Read normal maps from the normals slot and height maps from the height slot
        #[arg(long)]
        conventional_slots: bool,
    },
    /// Print the contents of a cache snapshot
    Inspect {
        snapshot: PathBuf,
    },
    /// Open a window and fly around a model
    View {
        base_path: PathBuf,
        file_name: String,
        /// JSON file with the window size
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
        #[arg(long)]
        gamma: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Import {
            base_path,
            file_name,
            gamma,
            verify_source,
            conventional_slots,
        } => {
            let options = LoadOptions {
                cache_policy: if verify_source {
                    CachePolicy::VerifySource
                } else {
                    CachePolicy::TrustExisting
                },
                slot_mapping: if conventional_slots {
                    TextureSlotMapping::conventional()
                } else {
                    TextureSlotMapping::legacy()
                },
                ..Default::default()
            };
            let model = ModelLoader::new()
                .with_options(options)
                .load_unbound(&base_path, &file_name, gamma)
                .with_context(|| {
                    format!("Failed to import {}", base_path.join(&file_name).display())
                })?;
            print_summary(&model);
            Ok(())
        }
        Command::Inspect { snapshot } => {
            let model = cache::load(&snapshot)
                .with_context(|| format!("Failed to read {}", snapshot.display()))?;
            print_summary(&model);
            Ok(())
        }
        Command::View {
            base_path,
            file_name,
            config,
            gamma,
        } => view(base_path, file_name, config, gamma),
    }
}

fn print_summary(model: &Model) {
    println!("{} ({})", model.file_name, model.cache_path().display());
    println!(
        "  {} meshes, {} vertices, {} indices, gamma correction {}",
        model.meshes.len(),
        model.vertex_count(),
        model.index_count(),
        if model.gamma_correction { "on" } else { "off" }
    );
    if !model.meshes.is_empty() {
        let (min, max) = model.bounds();
        println!("  bounds {:?} .. {:?}", min, max);
    }
    for mesh in &model.meshes {
        println!(
            "  mesh {:?}: {} vertices, {} triangles",
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len() / 3
        );
        for (texture, sampler) in mesh.textures.iter().zip(mesh.sampler_names()) {
            println!("    {} -> {}", sampler, texture.path.display());
        }
    }
}

fn view(base_path: PathBuf, file_name: String, config_path: PathBuf, gamma: bool) -> Result<()> {
    let config = Config::load(&config_path)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let window = WindowBuilder::new()
        .with_title(format!("Model viewer - {}", file_name))
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .build(&event_loop)
        .context("Failed to create window")?;

    let mut viewer = Viewer::new(window, config)?;
    viewer.load_model(&ModelLoader::new(), &base_path, &file_name, gamma)?;
    viewer.set_cursor_captured(true);

    event_loop.run(move |event, window_target| match event {
        Event::WindowEvent { window_id, event } if window_id == viewer.window().id() => {
            match event {
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(key_code),
                            state: key_state,
                            ..
                        },
                    ..
                } => {
                    let pressed = key_state == ElementState::Pressed;
                    if viewer.session.handle_key(key_code, pressed) == KeyAction::Exit {
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    viewer.session.handle_cursor_moved(position.x, position.y);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let (dx, dy) = match delta {
                        MouseScrollDelta::LineDelta(x, y) => (x, y),
                        MouseScrollDelta::PixelDelta(offset) => {
                            (offset.x as f32 / 20.0, offset.y as f32 / 20.0)
                        }
                    };
                    viewer.session.handle_scroll(dx, dy);
                }
                WindowEvent::Focused(focused) => {
                    if !focused {
                        viewer.session.release_input();
                    }
                    viewer.set_cursor_captured(focused);
                }
                WindowEvent::Resized(new_size) => viewer.resize(new_size),
                WindowEvent::CloseRequested => window_target.exit(),
                WindowEvent::RedrawRequested => match viewer.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        viewer.reconfigure()
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory");
                        window_target.exit();
                    }
                    Err(e) => log::warn!("Dropped frame: {:?}", e),
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            let dt = viewer.session.tick();
            viewer.session.update(dt);
            viewer.window().request_redraw();
        }
        Event::LoopExiting => viewer.shutdown(),
        _ => {}
    })?;

    Ok(())
}
