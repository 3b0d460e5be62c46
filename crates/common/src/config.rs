use crate::color::Color;
use crate::sequence::{ColorSequence, DEFAULT_ROTATION_PERIOD};

/// Clear colors assigned to window slots 0, 1, 2, ... before any rotation.
pub const DEFAULT_PALETTE: [Color; 4] = [Color::Black, Color::Teal, Color::Gray, Color::Olive];

/// Errors from harness configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one window is required")]
    NoWindows,
    #[error("{count} windows requested but only {available} clear colors are configured")]
    NotEnoughColors { count: usize, available: usize },
    #[error("{count} windows requested but only {available} window slots are configured")]
    NotEnoughSlots { count: usize, available: usize },
    #[error("rotation period must be at least one frame")]
    ZeroRotationPeriod,
    #[error("unknown color: {0}")]
    UnknownColor(String),
}

/// A configurable window position: placeholder title, size and screen position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSlot {
    pub default_title: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl WindowSlot {
    pub fn new(default_title: &str, width: u32, height: u32, x: i32, y: i32) -> Self {
        Self {
            default_title: default_title.to_string(),
            width,
            height,
            x,
            y,
        }
    }

    /// The three built-in slots.
    pub fn defaults() -> Vec<WindowSlot> {
        vec![
            WindowSlot::new("Test1", 700, 700, 0, 0),
            WindowSlot::new("Test2", 475, 475, 300, 300),
            WindowSlot::new("Test3", 200, 200, 500, 500),
        ]
    }
}

/// A resolved window request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

/// Raw, unvalidated harness settings as gathered from the command line.
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    pub window_count: usize,
    /// Positional titles. Missing entries fall back to the slot's placeholder.
    pub titles: Vec<String>,
    pub slots: Vec<WindowSlot>,
    pub palette: Vec<Color>,
    pub rotation_period: u32,
    /// Stop after this many outer iterations. `None` runs until a window closes.
    pub max_frames: Option<u64>,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            window_count: 1,
            titles: Vec::new(),
            slots: WindowSlot::defaults(),
            palette: DEFAULT_PALETTE.to_vec(),
            rotation_period: DEFAULT_ROTATION_PERIOD,
            max_frames: None,
        }
    }
}

impl HarnessSettings {
    /// Check slot and palette capacity and resolve window titles.
    pub fn validate(self) -> Result<HarnessConfig, ConfigError> {
        let count = self.window_count;
        if count == 0 {
            return Err(ConfigError::NoWindows);
        }
        if count > self.palette.len() {
            return Err(ConfigError::NotEnoughColors {
                count,
                available: self.palette.len(),
            });
        }
        if count > self.slots.len() {
            return Err(ConfigError::NotEnoughSlots {
                count,
                available: self.slots.len(),
            });
        }
        if self.rotation_period == 0 {
            return Err(ConfigError::ZeroRotationPeriod);
        }
        if self.titles.len() > count {
            tracing::warn!(
                given = self.titles.len(),
                count,
                "ignoring titles beyond the window count"
            );
        }

        let windows = self
            .slots
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, slot)| WindowSpec {
                title: self
                    .titles
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| slot.default_title.clone()),
                width: slot.width,
                height: slot.height,
                x: slot.x,
                y: slot.y,
            })
            .collect();

        Ok(HarnessConfig {
            windows,
            palette: self.palette,
            rotation_period: self.rotation_period,
            max_frames: self.max_frames,
        })
    }
}

/// Validated harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    windows: Vec<WindowSpec>,
    palette: Vec<Color>,
    rotation_period: u32,
    max_frames: Option<u64>,
}

impl HarnessConfig {
    pub fn windows(&self) -> &[WindowSpec] {
        &self.windows
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn rotation_period(&self) -> u32 {
        self.rotation_period
    }

    pub fn max_frames(&self) -> Option<u64> {
        self.max_frames
    }

    /// Fresh color sequence for the render loop.
    pub fn color_sequence(&self) -> ColorSequence {
        ColorSequence::new(self.palette.clone(), self.rotation_period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = HarnessSettings::default().validate().unwrap();
        assert_eq!(config.window_count(), 1);
        assert_eq!(config.windows()[0].title, "Test1");
        assert_eq!(config.windows()[0].width, 700);
        assert_eq!(config.rotation_period(), 100);
        assert_eq!(config.max_frames(), None);
    }

    #[test]
    fn titles_override_placeholders_in_order() {
        let config = HarnessSettings {
            window_count: 3,
            titles: vec!["left".into()],
            ..HarnessSettings::default()
        }
        .validate()
        .unwrap();

        let titles: Vec<&str> = config.windows().iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, ["left", "Test2", "Test3"]);
        assert_eq!((config.windows()[2].x, config.windows()[2].y), (500, 500));
    }

    #[test]
    fn rejects_zero_windows() {
        let err = HarnessSettings {
            window_count: 0,
            ..HarnessSettings::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoWindows));
    }

    #[test]
    fn rejects_more_windows_than_colors() {
        let err = HarnessSettings {
            window_count: 3,
            palette: vec![Color::Red, Color::Blue],
            ..HarnessSettings::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotEnoughColors {
                count: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn rejects_more_windows_than_slots() {
        let err = HarnessSettings {
            window_count: 4,
            ..HarnessSettings::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotEnoughSlots {
                count: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn rejects_zero_period() {
        let err = HarnessSettings {
            rotation_period: 0,
            ..HarnessSettings::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroRotationPeriod));
        assert_eq!(err.to_string(), "rotation period must be at least one frame");
    }

    #[test]
    fn color_sequence_uses_palette() {
        let config = HarnessSettings::default().validate().unwrap();
        let seq = config.color_sequence();
        assert_eq!(seq.colors(), &DEFAULT_PALETTE);
        assert_eq!(seq.period(), 100);
    }
}
