//! Render core: the frame loop and the input-to-camera pipeline.
//!
//! The loop drives any [`RenderBackend`]; the wgpu backend lives in its own
//! crate and [`HeadlessBackend`] records calls for tests and the CLI.
//!
//! # Invariants
//! - The loop runs only while every window is open.
//! - A window is made current before anything is drawn into it.
//! - Delta time is computed once per outer iteration and shared by all windows.
//! - Camera pitch stays within +-89 degrees, zoom within [1, 45] degrees.

mod backend;
mod camera;
mod context;
mod draw;
mod headless;
mod render_loop;
mod timer;
mod window_set;

pub use backend::{DrawCall, FrameEvent, RenderBackend, RenderError};
pub use camera::{CameraMovement, FlyCamera};
pub use context::{ColorToggle, HarnessContext};
pub use draw::{DrawStep, FrameComposer, FrameInfo, Shape, animated_color};
pub use headless::{BackendCall, HeadlessBackend};
pub use render_loop::{LoopState, RenderLoop, StopReason};
pub use timer::FrameTimer;
pub use window_set::{WindowSet, WindowState};

pub fn crate_info() -> &'static str {
    "colorcube-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
