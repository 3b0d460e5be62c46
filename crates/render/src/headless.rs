use colorcube_common::{Color, HarnessConfig};
use std::cell::Cell;
use std::rc::Rc;

use crate::backend::{DrawCall, FrameEvent, RenderBackend, RenderError};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SetClearColor(Color),
    MakeCurrent(usize),
    Render { slot: usize, color: [f32; 4] },
    Swap(usize),
    Poll,
    Release(usize),
}

impl BackendCall {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendCall::SetClearColor(_) => "clear_color",
            BackendCall::MakeCurrent(_) => "make_current",
            BackendCall::Render { .. } => "render",
            BackendCall::Swap(_) => "swap",
            BackendCall::Poll => "poll",
            BackendCall::Release(_) => "release",
        }
    }
}

struct Scheduled {
    at_poll: u64,
    slot: usize,
    event: FrameEvent<char>,
}

/// Backend without a GPU or windowing system.
///
/// Records every call, remembers which clear color each window was drawn
/// with, and replays scripted input. Keys are plain `char`s. Useful for tests
/// and for exercising the loop from the command line.
pub struct HeadlessBackend {
    sizes: Vec<(u32, u32)>,
    clear_color: Color,
    current: Option<usize>,
    calls: Vec<BackendCall>,
    clear_history: Vec<Vec<Color>>,
    scheduled: Vec<Scheduled>,
    polls: u64,
    released: Vec<bool>,
    release_count: Rc<Cell<usize>>,
    failing_slot: Option<usize>,
}

impl HeadlessBackend {
    pub fn new(config: &HarnessConfig) -> Self {
        let sizes: Vec<(u32, u32)> = config
            .windows()
            .iter()
            .map(|w| (w.width, w.height))
            .collect();
        let count = sizes.len();
        Self {
            sizes,
            clear_color: Color::Black,
            current: None,
            calls: Vec::new(),
            clear_history: vec![Vec::new(); count],
            scheduled: Vec::new(),
            polls: 0,
            released: vec![false; count],
            release_count: Rc::new(Cell::new(0)),
            failing_slot: None,
        }
    }

    /// Deliver `event` for `slot` on the `at_poll`-th poll (1-based, counted
    /// across all windows). Events sharing a poll arrive in scheduling order.
    pub fn schedule(&mut self, at_poll: u64, slot: usize, event: FrameEvent<char>) -> &mut Self {
        self.scheduled.push(Scheduled {
            at_poll,
            slot,
            event,
        });
        self
    }

    /// Make activation of `slot` fail, as a lost context would.
    pub fn fail_activation(&mut self, slot: usize) {
        self.failing_slot = Some(slot);
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Clear colors the window was rendered with, one entry per frame.
    pub fn clear_history(&self, slot: usize) -> &[Color] {
        self.clear_history
            .get(slot)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn is_released(&self, slot: usize) -> bool {
        self.released.get(slot).copied().unwrap_or(false)
    }

    /// Shared count of release calls; stays readable after the backend drops.
    pub fn release_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.release_count)
    }

    /// Text trace of the clear colors per frame, one line per frame.
    pub fn trace(&self) -> String {
        let frames = self.clear_history.iter().map(Vec::len).max().unwrap_or(0);
        let mut out = String::new();
        for frame in 0..frames {
            out.push_str(&format!("frame {:>5}:", frame + 1));
            for history in &self.clear_history {
                match history.get(frame) {
                    Some(c) => out.push_str(&format!(" {c:<7}")),
                    None => out.push_str(" -      "),
                }
            }
            out.push('\n');
        }
        out
    }

    fn check_slot(&self, slot: usize) -> Result<(), RenderError> {
        if slot < self.sizes.len() {
            Ok(())
        } else {
            Err(RenderError::NoSuchWindow {
                slot,
                count: self.sizes.len(),
            })
        }
    }
}

impl RenderBackend for HeadlessBackend {
    type Key = char;

    fn window_count(&self) -> usize {
        self.sizes.len()
    }

    fn aspect_ratio(&self, slot: usize) -> f32 {
        self.sizes
            .get(slot)
            .map(|(w, h)| *w as f32 / (*h).max(1) as f32)
            .unwrap_or(1.0)
    }

    fn version_string(&self) -> String {
        "headless (no GPU)".to_string()
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
        self.calls.push(BackendCall::SetClearColor(color));
    }

    fn make_current(&mut self, slot: usize) -> Result<(), RenderError> {
        self.check_slot(slot)?;
        if self.failing_slot == Some(slot) {
            return Err(RenderError::Activation {
                slot,
                reason: "context lost".into(),
            });
        }
        self.current = Some(slot);
        self.calls.push(BackendCall::MakeCurrent(slot));
        Ok(())
    }

    fn render(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        let slot = self.current.ok_or(RenderError::NotCurrent)?;
        self.clear_history[slot].push(self.clear_color);
        self.calls.push(BackendCall::Render {
            slot,
            color: call.color,
        });
        Ok(())
    }

    fn swap_buffers(&mut self, slot: usize) -> Result<(), RenderError> {
        self.check_slot(slot)?;
        self.calls.push(BackendCall::Swap(slot));
        Ok(())
    }

    fn poll_events(&mut self, events: &mut Vec<(usize, FrameEvent<char>)>) {
        self.polls += 1;
        self.calls.push(BackendCall::Poll);
        let polls = self.polls;
        let (due, pending): (Vec<Scheduled>, Vec<Scheduled>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|s| s.at_poll <= polls);
        self.scheduled = pending;
        events.extend(due.into_iter().map(|s| (s.slot, s.event)));
    }

    fn release_drawable(&mut self, slot: usize) -> Result<(), RenderError> {
        self.check_slot(slot)?;
        self.released[slot] = true;
        self.release_count.set(self.release_count.get() + 1);
        self.calls.push(BackendCall::Release(slot));
        Ok(())
    }
}
