use colorcube_input::KeyActionRegistry;
use colorcube_render::{CameraMovement, HarnessContext};
use winit::keyboard::KeyCode;

/// Install the harness key bindings. All of them fire on key release.
///
/// - W/A/S/D move the camera, scaled by the frame's delta time.
/// - E toggles one-color mode, picking a fresh color when it turns on.
/// - Q rerolls the one-color color while that mode is on.
/// - Escape exits the process at once.
pub fn register(registry: &mut KeyActionRegistry<KeyCode, HarnessContext>) {
    registry
        .add_continuous(KeyCode::KeyW, |ctx, dt| {
            ctx.camera.process_keyboard(CameraMovement::Forward, dt)
        })
        .add_continuous(KeyCode::KeyS, |ctx, dt| {
            ctx.camera.process_keyboard(CameraMovement::Backward, dt)
        })
        .add_continuous(KeyCode::KeyA, |ctx, dt| {
            ctx.camera.process_keyboard(CameraMovement::Left, dt)
        })
        .add_continuous(KeyCode::KeyD, |ctx, dt| {
            ctx.camera.process_keyboard(CameraMovement::Right, dt)
        })
        .add_instant(KeyCode::KeyE, |ctx| ctx.toggle.toggle_one_color())
        .add_instant(KeyCode::KeyQ, |ctx| {
            ctx.toggle.reroll_static_color();
        })
        .add_instant(KeyCode::Escape, |_| {
            tracing::info!("escape released, exiting");
            std::process::exit(0);
        });
}
