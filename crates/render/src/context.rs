use colorcube_common::Color;
use rand::Rng;

use crate::camera::FlyCamera;

/// Frozen-color switch read by the draw step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorToggle {
    /// Draw with `static_color` instead of the animated color.
    pub one_color: bool,
    pub static_color: Color,
}

impl Default for ColorToggle {
    fn default() -> Self {
        Self {
            one_color: false,
            static_color: Color::White,
        }
    }
}

impl ColorToggle {
    /// Flip `one_color`. Switching it on picks a fresh random static color.
    pub fn toggle_one_color(&mut self) {
        self.toggle_one_color_with(&mut rand::thread_rng());
    }

    pub fn toggle_one_color_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.one_color = !self.one_color;
        if self.one_color {
            self.static_color = Color::random_with(rng);
        }
        tracing::debug!(
            one_color = self.one_color,
            color = %self.static_color,
            "toggled one-color mode"
        );
    }

    /// Pick a new static color. Does nothing unless `one_color` is on.
    pub fn reroll_static_color(&mut self) -> bool {
        self.reroll_static_color_with(&mut rand::thread_rng())
    }

    pub fn reroll_static_color_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.one_color {
            return false;
        }
        self.static_color = Color::random_with(rng);
        tracing::debug!(color = %self.static_color, "new static color");
        true
    }
}

/// Mutable state shared by the loop, key actions and the draw step.
///
/// Owned by the [`RenderLoop`](crate::RenderLoop) and lent out by reference;
/// several independent instances can coexist.
#[derive(Debug, Clone, Default)]
pub struct HarnessContext {
    pub camera: FlyCamera,
    /// Seconds since the previous outer iteration.
    pub delta_time: f32,
    pub toggle: ColorToggle,
}

impl HarnessContext {
    pub fn new() -> Self {
        Self::default()
    }
}
