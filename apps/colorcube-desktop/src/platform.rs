use colorcube_common::{Color, HarnessConfig, WindowSpec};
use colorcube_input::{InputEvent, KeyState};
use colorcube_render::{DrawCall, FrameEvent, RenderBackend, RenderError, Shape};
use colorcube_render_wgpu::{SurfaceSource, WgpuRenderer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

/// Pumps allowed for the platform to deliver `resumed` and create windows.
const STARTUP_PUMPS: usize = 64;
const STARTUP_PUMP_TIMEOUT: Duration = Duration::from_millis(16);
/// Pixels per scroll line for touchpad-style deltas.
const PIXELS_PER_LINE: f64 = 20.0;

fn key_state(state: ElementState, repeat: bool) -> KeyState {
    match (state, repeat) {
        (ElementState::Released, _) => KeyState::Released,
        (ElementState::Pressed, true) => KeyState::Repeat,
        (ElementState::Pressed, false) => KeyState::Pressed,
    }
}

fn scroll_offset(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
    }
}

/// Creates the configured windows on first resume and buffers their events,
/// tagged with window slot.
struct EventCollector {
    specs: Vec<WindowSpec>,
    windows: Vec<Arc<Window>>,
    slots: HashMap<WindowId, usize>,
    creation_error: Option<RenderError>,
    events: Vec<(usize, FrameEvent<KeyCode>)>,
    resizes: Vec<(usize, u32, u32)>,
}

impl ApplicationHandler for EventCollector {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() || self.creation_error.is_some() {
            return;
        }
        for spec in &self.specs {
            let attrs = Window::default_attributes()
                .with_title(spec.title.as_str())
                .with_inner_size(PhysicalSize::new(spec.width, spec.height))
                .with_position(PhysicalPosition::new(spec.x, spec.y));
            match event_loop.create_window(attrs) {
                Ok(window) => {
                    self.slots.insert(window.id(), self.windows.len());
                    self.windows.push(Arc::new(window));
                }
                Err(e) => {
                    self.creation_error = Some(RenderError::WindowCreation {
                        title: spec.title.clone(),
                        reason: e.to_string(),
                    });
                    return;
                }
            }
        }
        tracing::debug!(windows = self.windows.len(), "windows created");
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(&slot) = self.slots.get(&id) else {
            return;
        };
        let event = match event {
            WindowEvent::CloseRequested => FrameEvent::CloseRequested,
            WindowEvent::Resized(size) => {
                self.resizes.push((slot, size.width, size.height));
                return;
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => FrameEvent::Input(InputEvent::Key {
                key,
                state: key_state(state, repeat),
            }),
            WindowEvent::CursorMoved { position, .. } => {
                FrameEvent::Input(InputEvent::CursorMoved {
                    x: position.x,
                    y: position.y,
                })
            }
            WindowEvent::MouseWheel { delta, .. } => FrameEvent::Input(InputEvent::Scroll {
                y_offset: scroll_offset(delta),
            }),
            _ => return,
        };
        self.events.push((slot, event));
    }
}

/// The winit event loop, driven by non-blocking pumps from the render loop.
struct Platform {
    event_loop: EventLoop<()>,
    collector: EventCollector,
    exited: bool,
}

impl Platform {
    fn new(specs: &[WindowSpec]) -> Result<Self, RenderError> {
        let event_loop = EventLoop::new().map_err(|e| RenderError::EventLoop(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut platform = Self {
            event_loop,
            collector: EventCollector {
                specs: specs.to_vec(),
                windows: Vec::with_capacity(specs.len()),
                slots: HashMap::new(),
                creation_error: None,
                events: Vec::new(),
                resizes: Vec::new(),
            },
            exited: false,
        };

        for _ in 0..STARTUP_PUMPS {
            platform.pump(Some(STARTUP_PUMP_TIMEOUT));
            if let Some(err) = platform.collector.creation_error.take() {
                return Err(err);
            }
            if platform.collector.windows.len() == specs.len() {
                // Startup resizes are already reflected in the initial sizes.
                platform.collector.resizes.clear();
                return Ok(platform);
            }
            if platform.exited {
                break;
            }
        }
        Err(RenderError::EventLoop(
            "the platform never resumed the application".into(),
        ))
    }

    fn windows(&self) -> &[Arc<Window>] {
        &self.collector.windows
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        if self.exited {
            return;
        }
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(timeout, &mut self.collector)
        {
            tracing::debug!(code, "event loop exited");
            self.exited = true;
            let slots = 0..self.collector.windows.len();
            self.collector
                .events
                .extend(slots.map(|slot| (slot, FrameEvent::CloseRequested)));
        }
    }
}

/// [`RenderBackend`] over real windows: winit for windows and input, wgpu
/// for drawing.
pub struct DesktopBackend {
    // Dropped before the platform so surfaces go before their windows.
    renderer: WgpuRenderer,
    platform: Platform,
    released: Vec<bool>,
}

impl DesktopBackend {
    pub fn new(config: &HarnessConfig, shape: Shape) -> Result<Self, RenderError> {
        let platform = Platform::new(config.windows())?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let sources = platform
            .windows()
            .iter()
            .enumerate()
            .map(|(slot, window)| {
                let size = window.inner_size();
                instance
                    .create_surface(Arc::clone(window))
                    .map(|surface| SurfaceSource {
                        surface,
                        width: size.width,
                        height: size.height,
                    })
                    .map_err(|e| RenderError::Surface {
                        slot,
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let renderer = WgpuRenderer::new(&instance, sources, shape)?;
        let released = vec![false; renderer.window_count()];
        Ok(Self {
            renderer,
            platform,
            released,
        })
    }
}

impl RenderBackend for DesktopBackend {
    type Key = KeyCode;

    fn window_count(&self) -> usize {
        self.renderer.window_count()
    }

    fn aspect_ratio(&self, slot: usize) -> f32 {
        self.renderer.aspect_ratio(slot)
    }

    fn version_string(&self) -> String {
        self.renderer.description()
    }

    fn set_clear_color(&mut self, color: Color) {
        self.renderer.set_clear_color(color);
    }

    fn make_current(&mut self, slot: usize) -> Result<(), RenderError> {
        self.renderer.begin_frame(slot)
    }

    fn render(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        self.renderer.draw(call)
    }

    fn swap_buffers(&mut self, slot: usize) -> Result<(), RenderError> {
        if let Some(window) = self.platform.windows().get(slot) {
            window.pre_present_notify();
        }
        self.renderer.present(slot)
    }

    fn poll_events(&mut self, events: &mut Vec<(usize, FrameEvent<KeyCode>)>) {
        self.platform.pump(Some(Duration::ZERO));
        for (slot, width, height) in self.platform.collector.resizes.drain(..) {
            self.renderer.resize(slot, width, height);
        }
        events.append(&mut self.platform.collector.events);
    }

    fn release_drawable(&mut self, slot: usize) -> Result<(), RenderError> {
        let count = self.released.len();
        let flag = self
            .released
            .get_mut(slot)
            .ok_or(RenderError::NoSuchWindow { slot, count })?;
        *flag = true;
        if let Some(window) = self.platform.windows().get(slot) {
            window.set_visible(false);
        }
        if self.released.iter().all(|r| *r) {
            self.renderer.release_mesh();
        }
        Ok(())
    }
}
