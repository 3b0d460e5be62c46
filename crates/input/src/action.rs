/// Transition reported for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    Pressed,
    Released,
    /// Auto-repeat while the key is held.
    Repeat,
}

/// An input event delivered to the harness, generic over the platform key type.
///
/// Platform layers translate their native events into these; the render loop
/// never sees raw windowing-system events.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent<K> {
    Key { key: K, state: KeyState },
    /// Absolute cursor position in window coordinates.
    CursorMoved { x: f64, y: f64 },
    /// Vertical scroll amount, positive away from the user.
    Scroll { y_offset: f32 },
}

impl<K> InputEvent<K> {
    /// The key, if this is a release event.
    pub fn released_key(&self) -> Option<&K> {
        match self {
            InputEvent::Key {
                key,
                state: KeyState::Released,
            } => Some(key),
            _ => None,
        }
    }
}
