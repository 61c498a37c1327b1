pub mod camera;
pub mod input;
#[cfg(test)]
mod tests;

pub use camera::{Camera, CameraMovement};
pub use input::MovementState;

use std::time::Instant;
use winit::keyboard::KeyCode;

use crate::config::Config;

/// What the window loop should do after a key event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Exit,
    DumpCameraInfo,
    Movement,
    Ignored,
}

/// Per-window interaction state: config, camera, held keys and frame timing.
pub struct Session {
    config: Config,
    pub camera: Camera,
    movement: MovementState,
    last_frame: Instant,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let mut camera = Camera::default();
        // The cursor starts out in the middle of the window.
        camera.on_pointer_move(config.width as f32 / 2.0, config.height as f32 / 2.0);

        Self {
            config,
            camera,
            movement: MovementState::default(),
            last_frame: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn movement(&self) -> MovementState {
        self.movement
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.aspect_ratio()
    }

    pub fn handle_cursor_moved(&mut self, x: f64, y: f64) {
        self.camera.on_pointer_move(x as f32, y as f32);
    }

    pub fn handle_scroll(&mut self, dx: f32, dy: f32) {
        self.camera.on_scroll(dx, dy);
    }

    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> KeyAction {
        match key {
            KeyCode::Escape if pressed => KeyAction::Exit,
            KeyCode::KeyI if pressed => {
                self.dump_camera_info();
                KeyAction::DumpCameraInfo
            }
            _ if self.movement.process_keyboard(key, pressed) => KeyAction::Movement,
            _ => KeyAction::Ignored,
        }
    }

    /// Drops held keys and the pointer baseline, e.g. when focus is lost.
    pub fn release_input(&mut self) {
        self.movement.clear();
        self.camera.reset_pointer();
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        dt
    }

    pub fn update(&mut self, dt: f32) {
        for movement in self.movement.active() {
            self.camera.process_movement(movement, dt);
        }
    }

    fn dump_camera_info(&self) {
        log::info!("Information dump");
        log::info!("Camera position: {:?}", self.camera.position());
        log::info!("Camera front: {:?}", self.camera.front());
        log::info!("Camera up: {:?}", self.camera.up());
    }
}
