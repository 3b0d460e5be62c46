use colorcube_common::Color;
use colorcube_input::InputEvent;
use glam::Mat4;
use std::fmt;
use std::hash::Hash;

/// Errors from context bootstrap and per-frame backend calls.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create event loop: {0}")]
    EventLoop(String),
    #[error("failed to create window '{title}': {reason}")]
    WindowCreation { title: String, reason: String },
    #[error("failed to create surface for window {slot}: {reason}")]
    Surface { slot: usize, reason: String },
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    Device(String),
    #[error("shader '{label}' failed to compile: {reason}")]
    Shader { label: String, reason: String },
    #[error("backend has {actual} windows but {expected} were configured")]
    WindowCountMismatch { expected: usize, actual: usize },
    #[error("window slot {slot} out of range (have {count})")]
    NoSuchWindow { slot: usize, count: usize },
    #[error("cannot make window {slot} current: {reason}")]
    Activation { slot: usize, reason: String },
    #[error("no window is current")]
    NotCurrent,
}

/// Something that happened to a window since the last poll.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent<K> {
    Input(InputEvent<K>),
    CloseRequested,
}

/// Everything a backend needs to issue one draw of the harness primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    /// Uniform color, used unless `vertex_colors` is set.
    pub color: [f32; 4],
    /// Shade with the mesh's per-vertex colors instead of `color`.
    pub vertex_colors: bool,
}

impl Default for DrawCall {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            color: [1.0, 1.0, 1.0, 1.0],
            vertex_colors: false,
        }
    }
}

/// Capability set the render loop drives.
///
/// Context creation happens in the implementor's constructor; the render
/// resources it needs (pipeline, mesh) are created there too, before the loop
/// starts. Dropping the backend releases the context.
pub trait RenderBackend {
    /// Platform key identifier carried by input events.
    type Key: Eq + Hash + fmt::Debug;

    fn window_count(&self) -> usize;

    /// Width over height of the window's drawable area.
    fn aspect_ratio(&self, slot: usize) -> f32;

    /// Human-readable API/adapter description.
    fn version_string(&self) -> String;

    /// Color used to clear the next window drawn.
    fn set_clear_color(&mut self, color: Color);

    /// Direct subsequent clear/render calls at this window.
    fn make_current(&mut self, slot: usize) -> Result<(), RenderError>;

    /// Clear the current window and draw the primitive.
    fn render(&mut self, call: &DrawCall) -> Result<(), RenderError>;

    /// Present the window's frame.
    fn swap_buffers(&mut self, slot: usize) -> Result<(), RenderError>;

    /// Drain pending events without blocking, appending them to `events`
    /// tagged with their window slot.
    fn poll_events(&mut self, events: &mut Vec<(usize, FrameEvent<Self::Key>)>);

    /// Free the drawable resources tied to this window.
    fn release_drawable(&mut self, slot: usize) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_draw_call_is_identity() {
        let call = DrawCall::default();
        assert_eq!(call.model, Mat4::IDENTITY);
        assert!(!call.vertex_colors);
    }

    #[test]
    fn error_messages_name_the_window() {
        let err = RenderError::Activation {
            slot: 2,
            reason: "surface lost".into(),
        };
        assert_eq!(err.to_string(), "cannot make window 2 current: surface lost");
    }
}
