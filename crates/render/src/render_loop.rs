use colorcube_common::{ColorSequence, HarnessConfig};
use colorcube_input::{InputEvent, KeyActionRegistry};

use crate::backend::{FrameEvent, RenderBackend, RenderError};
use crate::context::HarnessContext;
use crate::draw::{DrawStep, FrameInfo};
use crate::timer::FrameTimer;
use crate::window_set::WindowSet;

/// Loop state machine: `Running` self-loops per frame until it moves to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The window in this slot requested close.
    WindowClosed(usize),
    /// The configured frame cap was reached.
    FrameLimit,
}

/// Drives a backend through the per-window frame sequence.
///
/// Each outer iteration ticks the timer once, then for every window in slot
/// order sets its clear color, makes it current, draws, presents and polls
/// input. Key releases run bound actions against the loop's
/// [`HarnessContext`]; cursor and scroll events go to the camera.
///
/// Drawable resources are released exactly once: at the end of
/// [`run`](Self::run), or on drop if the loop exits early through an error.
pub struct RenderLoop<B: RenderBackend, D: DrawStep> {
    backend: B,
    draw: D,
    windows: WindowSet,
    colors: ColorSequence,
    timer: FrameTimer,
    registry: KeyActionRegistry<B::Key, HarnessContext>,
    ctx: HarnessContext,
    state: LoopState,
    stop_reason: Option<StopReason>,
    frames: u64,
    max_frames: Option<u64>,
    events: Vec<(usize, FrameEvent<B::Key>)>,
    released: bool,
}

impl<B: RenderBackend, D: DrawStep> RenderLoop<B, D> {
    pub fn new(config: &HarnessConfig, backend: B, draw: D) -> Result<Self, RenderError> {
        if backend.window_count() != config.window_count() {
            return Err(RenderError::WindowCountMismatch {
                expected: config.window_count(),
                actual: backend.window_count(),
            });
        }
        Ok(Self {
            backend,
            draw,
            windows: WindowSet::from_config(config),
            colors: config.color_sequence(),
            timer: FrameTimer::new(),
            registry: KeyActionRegistry::new(),
            ctx: HarnessContext::new(),
            state: LoopState::Running,
            stop_reason: None,
            frames: 0,
            max_frames: config.max_frames(),
            events: Vec::new(),
            released: false,
        })
    }

    pub fn with_context(mut self, ctx: HarnessContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn with_timer(mut self, timer: FrameTimer) -> Self {
        self.timer = timer;
        self
    }

    pub fn registry_mut(&mut self) -> &mut KeyActionRegistry<B::Key, HarnessContext> {
        &mut self.registry
    }

    pub fn context(&self) -> &HarnessContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut HarnessContext {
        &mut self.ctx
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    pub fn colors(&self) -> &ColorSequence {
        &self.colors
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Completed outer iterations.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one outer iteration, or stop if a window is closing or the frame
    /// cap is reached.
    pub fn step(&mut self) -> Result<LoopState, RenderError> {
        if self.state == LoopState::Stopped {
            return Ok(LoopState::Stopped);
        }
        if let Some(slot) = self.windows.first_closing() {
            return Ok(self.stop(StopReason::WindowClosed(slot)));
        }
        if self.max_frames.is_some_and(|max| self.frames >= max) {
            return Ok(self.stop(StopReason::FrameLimit));
        }

        self.ctx.delta_time = self.timer.tick();
        let time = self.timer.frame_time();

        for slot in 0..self.windows.len() {
            let color = self
                .colors
                .color_at(slot)
                .ok_or(RenderError::NoSuchWindow {
                    slot,
                    count: self.colors.len(),
                })?;
            self.backend.set_clear_color(color);
            self.backend.make_current(slot)?;

            let frame = FrameInfo {
                slot,
                time,
                aspect: self.backend.aspect_ratio(slot),
            };
            let call = self.draw.draw(&self.ctx, &frame);
            self.backend.render(&call)?;
            self.backend.swap_buffers(slot)?;

            self.poll_and_dispatch();
        }

        self.frames += 1;
        self.colors.frame_completed();
        Ok(LoopState::Running)
    }

    /// Step until stopped, then release drawable resources.
    pub fn run(&mut self) -> Result<StopReason, RenderError> {
        tracing::info!(
            windows = self.windows.len(),
            backend = %self.backend.version_string(),
            "render loop starting"
        );
        while self.step()? == LoopState::Running {}
        self.release()?;
        Ok(self.stop_reason.unwrap_or(StopReason::FrameLimit))
    }

    /// Release each window's drawable resources. Idempotent.
    pub fn release(&mut self) -> Result<(), RenderError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        for slot in 0..self.windows.len() {
            self.backend.release_drawable(slot)?;
        }
        tracing::debug!("released drawable resources");
        Ok(())
    }

    fn stop(&mut self, reason: StopReason) -> LoopState {
        tracing::info!(?reason, frames = self.frames, "render loop stopping");
        self.state = LoopState::Stopped;
        self.stop_reason = Some(reason);
        LoopState::Stopped
    }

    fn poll_and_dispatch(&mut self) {
        let mut events = std::mem::take(&mut self.events);
        self.backend.poll_events(&mut events);
        for (slot, event) in events.drain(..) {
            self.dispatch(slot, event);
        }
        self.events = events;
    }

    fn dispatch(&mut self, slot: usize, event: FrameEvent<B::Key>) {
        match event {
            FrameEvent::CloseRequested => {
                if self.windows.request_close(slot) {
                    tracing::info!(slot, "window requested close");
                }
            }
            FrameEvent::Input(InputEvent::Key { key, state }) => {
                let dt = self.ctx.delta_time;
                self.registry.handle_key(&key, state, &mut self.ctx, dt);
            }
            FrameEvent::Input(InputEvent::CursorMoved { x, y }) => {
                self.ctx.camera.process_cursor_position(x, y);
            }
            FrameEvent::Input(InputEvent::Scroll { y_offset }) => {
                self.ctx.camera.process_mouse_scroll(y_offset);
            }
        }
    }
}

impl<B: RenderBackend, D: DrawStep> Drop for RenderLoop<B, D> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("failed to release drawable resources: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DrawCall;
    use crate::draw::{FrameComposer, Shape};
    use crate::camera::CameraMovement;
    use crate::headless::{BackendCall, HeadlessBackend};
    use approx::assert_relative_eq;
    use colorcube_common::{Color, HarnessSettings};
    use colorcube_input::KeyState;
    use std::cell::Cell;
    use std::rc::Rc;

    fn config(windows: usize, max_frames: Option<u64>) -> HarnessConfig {
        HarnessSettings {
            window_count: windows,
            max_frames,
            ..HarnessSettings::default()
        }
        .validate()
        .unwrap()
    }

    fn headless_loop(
        windows: usize,
        max_frames: Option<u64>,
    ) -> RenderLoop<HeadlessBackend, FrameComposer> {
        let config = config(windows, max_frames);
        let backend = HeadlessBackend::new(&config);
        RenderLoop::new(&config, backend, FrameComposer::default()).unwrap()
    }

    #[test]
    fn rejects_backend_with_wrong_window_count() {
        let backend = HeadlessBackend::new(&config(1, None));
        let result = RenderLoop::new(&config(2, None), backend, FrameComposer::default());
        assert!(matches!(
            result,
            Err(RenderError::WindowCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn per_window_call_order() {
        let mut rl = headless_loop(2, Some(1));
        assert_eq!(rl.step().unwrap(), LoopState::Running);

        let calls = rl.backend().calls();
        let order: Vec<&str> = calls.iter().map(BackendCall::kind).collect();
        assert_eq!(
            order,
            [
                "clear_color",
                "make_current",
                "render",
                "swap",
                "poll",
                "clear_color",
                "make_current",
                "render",
                "swap",
                "poll"
            ]
        );
        assert_eq!(calls[1], BackendCall::MakeCurrent(0));
        assert_eq!(calls[6], BackendCall::MakeCurrent(1));
    }

    #[test]
    fn rotation_scenario_three_windows() {
        let mut rl = headless_loop(3, Some(101));
        for _ in 0..100 {
            rl.step().unwrap();
        }
        assert_eq!(
            rl.colors().colors(),
            &[Color::Teal, Color::Gray, Color::Olive, Color::Black]
        );
        rl.step().unwrap();

        let backend = rl.backend();
        for (slot, (before, after)) in [
            (Color::Black, Color::Teal),
            (Color::Teal, Color::Gray),
            (Color::Gray, Color::Olive),
        ]
        .into_iter()
        .enumerate()
        {
            let history = backend.clear_history(slot);
            assert_eq!(history.len(), 101);
            assert!(history[..100].iter().all(|c| *c == before), "slot {slot}");
            assert_eq!(history[100], after, "slot {slot}");
        }
    }

    #[test]
    fn halts_when_any_window_closes() {
        let config = config(3, None);
        let mut backend = HeadlessBackend::new(&config);
        // Third poll belongs to the last window of the first iteration.
        backend.schedule(3, 1, FrameEvent::CloseRequested);
        let mut rl = RenderLoop::new(&config, backend, FrameComposer::default()).unwrap();

        assert_eq!(rl.step().unwrap(), LoopState::Running);
        assert!(!rl.windows().all_open());
        assert_eq!(rl.step().unwrap(), LoopState::Stopped);
        assert_eq!(rl.stop_reason(), Some(StopReason::WindowClosed(1)));
        assert_eq!(rl.frames(), 1);

        // Slots 0 and 2 never closed, the loop still stopped.
        assert!(!rl.windows().get(0).unwrap().close_requested());
        assert!(!rl.windows().get(2).unwrap().close_requested());
        assert_eq!(rl.step().unwrap(), LoopState::Stopped);
        assert_eq!(rl.backend().clear_history(0).len(), 1);
    }

    #[test]
    fn run_stops_at_frame_limit_and_releases() {
        let mut rl = headless_loop(2, Some(5));
        let reason = rl.run().unwrap();
        assert_eq!(reason, StopReason::FrameLimit);
        assert_eq!(rl.frames(), 5);
        assert!(rl.backend().is_released(0));
        assert!(rl.backend().is_released(1));

        let releases = rl
            .backend()
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Release(_)))
            .count();
        rl.release().unwrap();
        let after = rl
            .backend()
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Release(_)))
            .count();
        assert_eq!(releases, 2);
        assert_eq!(after, 2);
    }

    #[test]
    fn key_release_runs_bound_action_with_delta_time() {
        let config = config(1, None);
        let mut backend = HeadlessBackend::new(&config);
        backend.schedule(
            1,
            0,
            FrameEvent::Input(InputEvent::Key {
                key: 'w',
                state: KeyState::Pressed,
            }),
        );
        backend.schedule(
            2,
            0,
            FrameEvent::Input(InputEvent::Key {
                key: 'w',
                state: KeyState::Released,
            }),
        );
        let mut rl = RenderLoop::new(&config, backend, FrameComposer::default()).unwrap();
        let received = Rc::new(Cell::new(None));
        let sink = Rc::clone(&received);
        rl.registry_mut().add_continuous('w', move |ctx: &mut HarnessContext, dt| {
            sink.set(Some(dt));
            ctx.camera.process_keyboard(CameraMovement::Forward, dt);
        });

        let start = rl.context().camera.position;
        rl.step().unwrap();
        assert_eq!(rl.context().camera.position, start, "press must not fire");
        assert_eq!(received.get(), None);

        rl.step().unwrap();
        let dt = rl.context().delta_time;
        assert_eq!(received.get(), Some(dt));
        let moved = start.z - rl.context().camera.position.z;
        assert_relative_eq!(moved, rl.context().camera.movement_speed * dt, epsilon = 1e-5);
    }

    #[test]
    fn pointer_events_drive_camera() {
        let config = config(1, None);
        let mut backend = HeadlessBackend::new(&config);
        backend
            .schedule(1, 0, FrameEvent::Input(InputEvent::CursorMoved { x: 100.0, y: 100.0 }))
            .schedule(2, 0, FrameEvent::Input(InputEvent::CursorMoved { x: 110.0, y: 95.0 }))
            .schedule(2, 0, FrameEvent::Input(InputEvent::Scroll { y_offset: 5.0 }));
        let mut rl = RenderLoop::new(&config, backend, FrameComposer::default()).unwrap();
        let yaw = rl.context().camera.yaw();

        rl.step().unwrap();
        assert_eq!(rl.context().camera.yaw(), yaw);
        rl.step().unwrap();
        assert!(rl.context().camera.yaw() > yaw);
        assert!(rl.context().camera.pitch() > 0.0);
        assert_eq!(rl.context().camera.zoom(), 40.0);
    }

    #[test]
    fn delta_time_is_shared_by_all_windows() {
        let config = config(3, Some(2));
        let backend = HeadlessBackend::new(&config);
        let mut seen = Vec::new();
        let draw = |ctx: &HarnessContext, frame: &FrameInfo| {
            seen.push((frame.slot, ctx.delta_time, frame.time));
            DrawCall::default()
        };
        let mut rl = RenderLoop::new(&config, backend, draw).unwrap();
        rl.step().unwrap();
        rl.step().unwrap();
        drop(rl);

        assert_eq!(seen.len(), 6);
        for chunk in seen.chunks(3) {
            assert_eq!(chunk[0].0, 0);
            assert_eq!(chunk[2].0, 2);
            assert!(chunk.iter().all(|s| s.1 == chunk[0].1 && s.2 == chunk[0].2));
        }
    }

    #[test]
    fn drop_releases_when_run_was_not_called() {
        let config = config(1, None);
        let backend = HeadlessBackend::new(&config);
        let released = backend.release_counter();
        let composer = FrameComposer::legacy(Shape::Cube);
        let mut rl = RenderLoop::new(&config, backend, composer).unwrap();
        rl.step().unwrap();
        drop(rl);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn render_failure_propagates() {
        let config = config(2, None);
        let mut backend = HeadlessBackend::new(&config);
        backend.fail_activation(1);
        let mut rl = RenderLoop::new(&config, backend, FrameComposer::default()).unwrap();
        let err = rl.step().unwrap_err();
        assert!(matches!(err, RenderError::Activation { slot: 1, .. }));
    }
}
