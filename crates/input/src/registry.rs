use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::action::KeyState;

/// A behavior bound to a key. Handlers receive the caller's context by
/// mutable reference; they never capture shared mutable state.
pub enum KeyAction<C> {
    /// Scaled by the frame's delta time.
    Continuous(Box<dyn FnMut(&mut C, f32)>),
    /// Fires once with no timing information.
    Instant(Box<dyn FnMut(&mut C)>),
}

impl<C> KeyAction<C> {
    pub fn continuous(f: impl FnMut(&mut C, f32) + 'static) -> Self {
        KeyAction::Continuous(Box::new(f))
    }

    pub fn instant(f: impl FnMut(&mut C) + 'static) -> Self {
        KeyAction::Instant(Box::new(f))
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, KeyAction::Continuous(_))
    }

    /// Run the handler. `delta_time` is only forwarded to continuous actions.
    pub fn invoke(&mut self, ctx: &mut C, delta_time: f32) {
        match self {
            KeyAction::Continuous(f) => f(ctx, delta_time),
            KeyAction::Instant(f) => f(ctx),
        }
    }
}

impl<C> fmt::Debug for KeyAction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAction::Continuous(_) => f.write_str("KeyAction::Continuous"),
            KeyAction::Instant(_) => f.write_str("KeyAction::Instant"),
        }
    }
}

/// Key-to-action table.
///
/// Registering a key that is already bound replaces the old handler. Lookups
/// for unbound keys are silent no-ops.
pub struct KeyActionRegistry<K, C> {
    actions: HashMap<K, KeyAction<C>>,
}

impl<K, C> Default for KeyActionRegistry<K, C> {
    fn default() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }
}

impl<K, C> fmt::Debug for KeyActionRegistry<K, C>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.actions.iter()).finish()
    }
}

impl<K, C> KeyActionRegistry<K, C>
where
    K: Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `action` to `key`, returning the handler it replaced.
    pub fn add_action(&mut self, key: K, action: KeyAction<C>) -> Option<KeyAction<C>> {
        tracing::debug!(?key, ?action, "binding key");
        let previous = self.actions.insert(key, action);
        if previous.is_some() {
            tracing::debug!("replaced existing key binding");
        }
        previous
    }

    /// Bind a delta-time-aware handler.
    pub fn add_continuous(
        &mut self,
        key: K,
        f: impl FnMut(&mut C, f32) + 'static,
    ) -> &mut Self {
        self.add_action(key, KeyAction::continuous(f));
        self
    }

    /// Bind a zero-argument handler.
    pub fn add_instant(&mut self, key: K, f: impl FnMut(&mut C) + 'static) -> &mut Self {
        self.add_action(key, KeyAction::instant(f));
        self
    }

    pub fn remove(&mut self, key: &K) -> Option<KeyAction<C>> {
        self.actions.remove(key)
    }

    pub fn is_bound(&self, key: &K) -> bool {
        self.actions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Invoke the handler bound to `key`. Returns whether anything ran.
    pub fn perform_action(&mut self, key: &K, ctx: &mut C, delta_time: f32) -> bool {
        match self.actions.get_mut(key) {
            Some(action) => {
                tracing::debug!(?key, delta_time, "performing key action");
                action.invoke(ctx, delta_time);
                true
            }
            None => false,
        }
    }

    /// Dispatch a raw key transition. Only releases trigger an action.
    pub fn handle_key(&mut self, key: &K, state: KeyState, ctx: &mut C, delta_time: f32) -> bool {
        match state {
            KeyState::Released => self.perform_action(key, ctx, delta_time),
            KeyState::Pressed | KeyState::Repeat => false,
        }
    }
}
