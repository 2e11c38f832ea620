//! Event name to handler registry.
//!
//! Registration is expected to happen at startup. The map sits behind a
//! lock so it is memory-safe to reconfigure at runtime, but dispatches
//! already in flight keep the handler they looked up.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::handler::EventHandler;
use crate::error::ConfigError;

/// One or more event names.
///
/// Accepts a single name or a list, so `register("a", h)` and
/// `register(["a", "b"], h)` both work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNames(Vec<String>);

impl EventNames {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.0.iter().find(|name| name.is_empty()) {
            Some(name) => Err(ConfigError::InvalidEventName { name: name.clone() }),
            None => Ok(()),
        }
    }
}

impl From<&str> for EventNames {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for EventNames {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for EventNames {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for EventNames {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for EventNames {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|name| name.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EventNames {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|name| name.to_string()).collect())
    }
}

/// Maps event names to handlers. At most one handler per name.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn EventHandler>>>,
}

fn same_handler(a: &Arc<dyn EventHandler>, b: &Arc<dyn EventHandler>) -> bool {
    // Compare allocations only; vtable pointers may differ across codegen units
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under one or more names.
    ///
    /// Registering the same `Arc` again under a name is a no-op. If any name
    /// is empty or bound to a different handler, nothing is registered.
    ///
    /// # Errors
    ///
    /// * `ConfigError::InvalidEventName` - a name is empty
    /// * `ConfigError::HandlerConflict` - a name is bound to another handler
    pub fn register(
        &self,
        names: impl Into<EventNames>,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), ConfigError> {
        let names = names.into();
        names.validate()?;

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        Self::check_conflicts(&handlers, &names, &handler)?;
        for name in names.iter() {
            debug!(event = %name, "Registering event handler");
            handlers.insert(name.to_string(), handler.clone());
        }
        Ok(())
    }

    /// Remove handlers. Names without a handler are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEventName` if a name is empty.
    pub fn unregister(&self, names: impl Into<EventNames>) -> Result<(), ConfigError> {
        let names = names.into();
        names.validate()?;

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        for name in names.iter() {
            if handlers.remove(name).is_some() {
                debug!(event = %name, "Unregistered event handler");
            }
        }
        Ok(())
    }

    /// Bind the handler registered for `name` to additional names.
    ///
    /// # Errors
    ///
    /// * `ConfigError::UnknownEvent` - `name` has no handler
    /// * `ConfigError::InvalidEventName` - an alias is empty
    /// * `ConfigError::HandlerConflict` - an alias is bound to another handler
    pub fn alias(&self, name: &str, aliases: impl Into<EventNames>) -> Result<(), ConfigError> {
        let aliases = aliases.into();
        aliases.validate()?;

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let handler = handlers
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownEvent {
                name: name.to_string(),
            })?;

        Self::check_conflicts(&handlers, &aliases, &handler)?;
        for alias in aliases.iter() {
            debug!(event = %name, alias = %alias, "Registering event alias");
            handlers.insert(alias.to_string(), handler.clone());
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn EventHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_conflicts(
        handlers: &HashMap<String, Arc<dyn EventHandler>>,
        names: &EventNames,
        handler: &Arc<dyn EventHandler>,
    ) -> Result<(), ConfigError> {
        for name in names.iter() {
            if let Some(existing) = handlers.get(name) {
                if !same_handler(existing, handler) {
                    return Err(ConfigError::HandlerConflict {
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("events", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
