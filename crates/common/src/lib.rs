//! Shared building blocks for the colorcube harness.
//!
//! # Invariants
//! - The palette is closed: every [`Color`] has a fixed RGB value.
//! - A [`ColorSequence`] only ever changes order, never membership.
//! - A [`HarnessConfig`] always has at least one window and a color per window.

pub mod color;
pub mod config;
pub mod sequence;

pub use color::Color;
pub use config::{
    ConfigError, DEFAULT_PALETTE, HarnessConfig, HarnessSettings, WindowSlot, WindowSpec,
};
pub use sequence::{ColorSequence, DEFAULT_ROTATION_PERIOD, move_forward};

pub fn crate_info() -> &'static str {
    "colorcube-common v0.1.0"
}
