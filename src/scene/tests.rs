use super::*;
use approx::assert_relative_eq;
use glam::Vec3;

fn session() -> Session {
    Session::new(Config { width: 800, height: 600 })
}

#[test]
fn test_session_new() {
    let session = session();
    assert_eq!(session.camera.position(), Vec3::new(0.0, 0.0, 3.0));
    assert_eq!(session.movement(), MovementState::default());
    assert_relative_eq!(session.aspect_ratio(), 800.0 / 600.0, epsilon = 0.0001);
}

#[test]
fn test_cursor_baseline_is_window_centre() {
    let mut session = session();

    session.handle_cursor_moved(400.0, 300.0);
    assert_eq!(session.camera.yaw(), -90.0);
    assert_eq!(session.camera.pitch(), 0.0);

    session.handle_cursor_moved(450.0, 250.0);
    assert_relative_eq!(session.camera.yaw(), -80.0, epsilon = 0.001);
    assert_relative_eq!(session.camera.pitch(), 10.0, epsilon = 0.001);
}

#[test]
fn test_scroll_zooms() {
    let mut session = session();
    session.handle_scroll(0.0, 5.0);
    assert_eq!(session.camera.fov(), 40.0);
}

#[test_log::test]
fn test_key_actions() {
    let mut session = session();

    assert_eq!(session.handle_key(KeyCode::Escape, true), KeyAction::Exit);
    assert_eq!(session.handle_key(KeyCode::Escape, false), KeyAction::Ignored);
    assert_eq!(session.handle_key(KeyCode::KeyI, true), KeyAction::DumpCameraInfo);
    assert_eq!(session.handle_key(KeyCode::KeyW, true), KeyAction::Movement);
    assert_eq!(session.handle_key(KeyCode::KeyQ, true), KeyAction::Ignored);

    assert!(session.movement().forward);
    assert_eq!(session.handle_key(KeyCode::KeyW, false), KeyAction::Movement);
    assert!(!session.movement().forward);
}

#[test]
fn test_update_applies_held_keys() {
    let mut session = session();
    session.handle_key(KeyCode::KeyW, true);
    session.handle_key(KeyCode::KeyD, true);

    session.update(1.0);
    let position = session.camera.position();
    assert_relative_eq!(position.z, 3.0 - 2.5, epsilon = 0.001);
    assert_relative_eq!(position.x, 2.5, epsilon = 0.001);

    session.handle_key(KeyCode::KeyW, false);
    session.handle_key(KeyCode::KeyD, false);
    session.update(1.0);
    assert_eq!(session.camera.position(), position);
}

#[test]
fn test_opposite_keys_cancel() {
    let mut session = session();
    session.handle_key(KeyCode::KeyA, true);
    session.handle_key(KeyCode::KeyD, true);

    session.update(0.5);
    assert_relative_eq!(session.camera.position().x, 0.0, epsilon = 0.001);
}

#[test]
fn test_release_input() {
    let mut session = session();
    session.handle_key(KeyCode::KeyS, true);
    session.release_input();
    assert_eq!(session.movement(), MovementState::default());

    // The next cursor sample is a fresh baseline.
    session.handle_cursor_moved(0.0, 0.0);
    assert_eq!(session.camera.yaw(), -90.0);
}

#[test]
fn test_tick_measures_elapsed_time() {
    let mut session = session();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let dt = session.tick();
    assert!(dt >= 0.005);
}
