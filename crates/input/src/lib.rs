//! Input layer: platform-neutral events and key-bound actions.
//!
//! # Invariants
//! - Key actions fire on release only; press and repeat never reach a handler.
//! - One handler per key; the latest registration wins.
//! - The registry holds no business state of its own.

pub mod action;
pub mod registry;

pub use action::{InputEvent, KeyState};
pub use registry::{KeyAction, KeyActionRegistry};

pub fn crate_info() -> &'static str {
    "colorcube-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
