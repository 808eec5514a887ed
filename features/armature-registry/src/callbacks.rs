use std::collections::HashMap;

use crate::types::Instance;

/// Handler invoked exactly once with a name's finalized instance
pub type SingletonCallback = Box<dyn FnOnce(&Instance) + Send>;

/// Per-name post-creation hooks
///
/// Handlers pile up while a name is still unbound and are drained in
/// registration order at the moment the instance first becomes available.
/// The registry invokes drained handlers with its lock released, so a
/// handler is free to call back into the registry.
#[derive(Default)]
pub(crate) struct CallbackRegistry {
    handlers: HashMap<String, Vec<SingletonCallback>>,
}

impl CallbackRegistry {
    pub(crate) fn add(&mut self, name: &str, handler: SingletonCallback) {
        self.handlers.entry(name.to_string()).or_default().push(handler);
    }

    /// Removes and returns the handlers for a name, in registration order
    ///
    /// Draining under the registry lock is what keeps every handler
    /// at exactly one invocation.
    pub(crate) fn drain(&mut self, name: &str) -> Vec<SingletonCallback> {
        self.handlers.remove(name).unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.handlers.clear();
    }
}
