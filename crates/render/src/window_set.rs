use colorcube_common::{HarnessConfig, WindowSpec};

/// Logical state of one window: what was requested and whether it wants to close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub spec: WindowSpec,
    close_requested: bool,
}

impl WindowState {
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}

/// Fixed set of windows, indexed by slot in declaration order.
#[derive(Debug, Clone)]
pub struct WindowSet {
    windows: Vec<WindowState>,
}

impl WindowSet {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            windows: config
                .windows()
                .iter()
                .cloned()
                .map(|spec| WindowState {
                    spec,
                    close_requested: false,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&WindowState> {
        self.windows.get(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowState> {
        self.windows.iter()
    }

    /// Set the slot's close flag. Returns `true` if the flag was newly set.
    pub fn request_close(&mut self, slot: usize) -> bool {
        match self.windows.get_mut(slot) {
            Some(w) if !w.close_requested => {
                w.close_requested = true;
                true
            }
            _ => false,
        }
    }

    /// Live only while every window is open.
    pub fn all_open(&self) -> bool {
        self.windows.iter().all(|w| !w.close_requested)
    }

    /// Lowest slot whose close flag is set.
    pub fn first_closing(&self) -> Option<usize> {
        self.windows.iter().position(|w| w.close_requested)
    }
}
