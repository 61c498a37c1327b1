use glam::{Mat4, Vec3};

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_SENSITIVITY: f32 = 0.2;
pub const DEFAULT_FOV: f32 = 45.0;

const PITCH_LIMIT: f32 = 89.0;
const MIN_FOV: f32 = 1.0;
const MAX_FOV: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// First-person camera driven by yaw/pitch angles in degrees.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    right: Vec3,
    /// Fixed world up; the view never rolls.
    up: Vec3,
    yaw: f32,   // Rotation around Y axis
    pitch: f32, // Rotation around X axis
    fov: f32,
    speed: f32,
    sensitivity: f32,
    last_x: f32,
    last_y: f32,
    first_mouse: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0))
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            fov: DEFAULT_FOV,
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
            last_x: 0.0,
            last_y: 0.0,
            first_mouse: true,
        };
        camera.update_vectors();
        camera
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, Z_NEAR, Z_FAR)
    }

    /// Feeds an absolute cursor position. The first sample after construction
    /// or [`Camera::reset_pointer`] only sets the baseline.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.first_mouse {
            self.last_x = x;
            self.last_y = y;
            self.first_mouse = false;
            return;
        }

        // Screen y grows downwards.
        let dx = (x - self.last_x) * self.sensitivity;
        let dy = (self.last_y - y) * self.sensitivity;
        self.last_x = x;
        self.last_y = y;

        self.yaw += dx;
        self.pitch = (self.pitch + dy).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Zooms by narrowing the field of view. Only the vertical offset is used.
    pub fn on_scroll(&mut self, _dx: f32, dy: f32) {
        self.fov = (self.fov - dy).clamp(MIN_FOV, MAX_FOV);
    }

    pub fn reset_pointer(&mut self) {
        self.first_mouse = true;
    }

    pub fn process_movement(&mut self, direction: CameraMovement, dt: f32) {
        let velocity = self.speed * dt;
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    fn update_vectors(&mut self) {
        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();
        self.front = Vec3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize();
        self.right = self.front.cross(self.up).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_initialization() {
        let camera = Camera::default();
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(camera.yaw(), -90.0);
        assert_eq!(camera.pitch(), 0.0);
        assert_eq!(camera.fov(), 45.0);

        assert_relative_eq!(camera.front().x, 0.0, epsilon = 0.001);
        assert_relative_eq!(camera.front().y, 0.0, epsilon = 0.001);
        assert_relative_eq!(camera.front().z, -1.0, epsilon = 0.001);
        assert_relative_eq!(camera.up().y, 1.0, epsilon = 0.001);
        assert_relative_eq!(camera.right().x, 1.0, epsilon = 0.001);
    }

    #[test]
    fn test_first_pointer_sample_does_not_rotate() {
        let mut camera = Camera::default();
        camera.on_pointer_move(512.0, 384.0);
        assert_eq!(camera.yaw(), -90.0);
        assert_eq!(camera.pitch(), 0.0);

        camera.on_pointer_move(522.0, 384.0);
        assert_relative_eq!(camera.yaw(), -90.0 + 10.0 * 0.2, epsilon = 0.001);

        // A reset makes the next sample a new baseline, however far it jumps.
        camera.reset_pointer();
        camera.on_pointer_move(0.0, 0.0);
        assert_relative_eq!(camera.yaw(), -88.0, epsilon = 0.001);
        assert_relative_eq!(camera.pitch(), 0.0, epsilon = 0.001);
    }

    #[test]
    fn test_pointer_up_raises_pitch() {
        let mut camera = Camera::default();
        camera.on_pointer_move(100.0, 100.0);
        camera.on_pointer_move(100.0, 50.0); // Move mouse up
        assert_relative_eq!(camera.pitch(), 10.0, epsilon = 0.001);
        assert!(camera.front().y > 0.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.on_pointer_move(0.0, 0.0);

        for step in 1..=50 {
            camera.on_pointer_move(0.0, -100.0 * step as f32);
            assert!(camera.pitch() <= 89.0);
        }
        assert_relative_eq!(camera.pitch(), 89.0, epsilon = 0.001);

        camera.on_pointer_move(0.0, 100_000.0);
        assert_relative_eq!(camera.pitch(), -89.0, epsilon = 0.001);
    }

    #[test]
    fn test_yaw_is_unbounded() {
        let mut camera = Camera::default();
        camera.on_pointer_move(0.0, 0.0);
        camera.on_pointer_move(5000.0, 0.0);
        assert_relative_eq!(camera.yaw(), 910.0, epsilon = 0.01);
    }

    #[test]
    fn test_basis_stays_orthonormal() {
        let mut camera = Camera::default();
        camera.on_pointer_move(0.0, 0.0);
        camera.on_pointer_move(137.0, -211.0);

        assert_relative_eq!(camera.front().length(), 1.0, epsilon = 0.0001);
        assert_relative_eq!(camera.right().length(), 1.0, epsilon = 0.0001);
        assert_relative_eq!(camera.front().dot(camera.right()), 0.0, epsilon = 0.0001);
        assert_relative_eq!(camera.right().y, 0.0, epsilon = 0.0001);
    }

    #[test]
    fn test_up_stays_world_up_when_pitched() {
        let mut camera = Camera::default();
        camera.on_pointer_move(0.0, 0.0);
        camera.on_pointer_move(40.0, -300.0);
        assert!(camera.pitch() > 45.0);

        assert_eq!(camera.up(), Vec3::Y);

        camera.process_movement(CameraMovement::Right, 1.0);
        assert_relative_eq!(camera.position().y, 0.0, epsilon = 0.0001);
    }

    #[test]
    fn test_fov_is_clamped() {
        let mut camera = Camera::default();
        camera.on_scroll(0.0, 10.0);
        assert_eq!(camera.fov(), 35.0);

        camera.on_scroll(0.0, 100.0);
        assert_eq!(camera.fov(), 1.0);

        camera.on_scroll(0.0, -3.0);
        assert_eq!(camera.fov(), 4.0);

        camera.on_scroll(25.0, -100.0);
        assert_eq!(camera.fov(), 45.0);
    }

    #[test]
    fn test_movement() {
        let mut camera = Camera::new(Vec3::ZERO);

        camera.process_movement(CameraMovement::Forward, 1.0);
        assert_relative_eq!(camera.position().z, -2.5, epsilon = 0.001);

        camera.process_movement(CameraMovement::Backward, 2.0);
        assert_relative_eq!(camera.position().z, 2.5, epsilon = 0.001);

        let mut camera = Camera::new(Vec3::ZERO).with_speed(4.0);
        camera.process_movement(CameraMovement::Right, 0.5);
        assert_relative_eq!(camera.position().x, 2.0, epsilon = 0.001);
        camera.process_movement(CameraMovement::Left, 1.0);
        assert_relative_eq!(camera.position().x, -2.0, epsilon = 0.001);
        assert_relative_eq!(camera.position().y, 0.0, epsilon = 0.001);
    }

    #[test]
    fn test_view_matrix_changes() {
        let mut camera = Camera::default();
        let initial = camera.view_matrix();

        camera.process_movement(CameraMovement::Right, 1.0);
        let moved = camera.view_matrix();
        assert_ne!(initial, moved);

        camera.on_pointer_move(0.0, 0.0);
        camera.on_pointer_move(50.0, 0.0);
        assert_ne!(moved, camera.view_matrix());

        // The camera's own position maps to the view-space origin.
        let eye = camera.view_matrix().transform_point3(camera.position());
        assert_relative_eq!(eye.length(), 0.0, epsilon = 0.0001);
    }

    #[test]
    fn test_projection_follows_fov() {
        let mut camera = Camera::default();
        let wide = camera.projection_matrix(16.0 / 9.0);
        camera.on_scroll(0.0, 20.0);
        let narrow = camera.projection_matrix(16.0 / 9.0);

        // Narrower fov means a larger vertical scale.
        assert!(narrow.col(1).y > wide.col(1).y);
        assert_relative_eq!(wide.col(1).y, 1.0 / (22.5f32).to_radians().tan(), epsilon = 0.001);
    }
}
