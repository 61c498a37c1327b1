use winit::keyboard::KeyCode;

use super::CameraMovement;

/// Movement keys currently held down.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementState {
    /// Records a W/A/S/D press or release. Returns false for any other key.
    pub fn process_keyboard(&mut self, key: KeyCode, pressed: bool) -> bool {
        match key {
            KeyCode::KeyW => self.forward = pressed,
            KeyCode::KeyS => self.backward = pressed,
            KeyCode::KeyA => self.left = pressed,
            KeyCode::KeyD => self.right = pressed,
            _ => return false,
        }
        true
    }

    pub fn active(&self) -> impl Iterator<Item = CameraMovement> {
        [
            (self.forward, CameraMovement::Forward),
            (self.backward, CameraMovement::Backward),
            (self.left, CameraMovement::Left),
            (self.right, CameraMovement::Right),
        ]
        .into_iter()
        .filter_map(|(held, movement)| held.then_some(movement))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_input() {
        let mut state = MovementState::default();

        let test_cases = [
            (KeyCode::KeyW, CameraMovement::Forward),
            (KeyCode::KeyS, CameraMovement::Backward),
            (KeyCode::KeyA, CameraMovement::Left),
            (KeyCode::KeyD, CameraMovement::Right),
        ];

        for (key, movement) in test_cases {
            assert!(state.process_keyboard(key, true));
            assert_eq!(
                state.active().collect::<Vec<_>>(),
                vec![movement],
                "Key {:?} not held",
                key
            );

            assert!(state.process_keyboard(key, false));
            assert_eq!(state.active().count(), 0, "Key {:?} not released", key);
        }
    }

    #[test]
    fn test_other_keys_ignored() {
        let mut state = MovementState::default();
        assert!(!state.process_keyboard(KeyCode::Space, true));
        assert!(!state.process_keyboard(KeyCode::KeyI, true));
        assert_eq!(state, MovementState::default());
    }

    #[test]
    fn test_clear() {
        let mut state = MovementState::default();
        state.process_keyboard(KeyCode::KeyW, true);
        state.process_keyboard(KeyCode::KeyD, true);
        assert_eq!(state.active().count(), 2);

        state.clear();
        assert_eq!(state.active().count(), 0);
    }
}
