//! Handler registry — name-keyed lookup table built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::handlers::Handler;

/// Registry of available handlers.
///
/// Populated before any task or worker exists, then shared behind an `Arc`
/// and only read, so it carries no lock.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A name may only be registered once.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> Result<(), RegistryError> {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        self.handlers.insert(name.clone(), handler);
        tracing::debug!("Registered handler: {}", name);
        Ok(())
    }

    /// Get a handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Get a handler by name, failing with [`RegistryError::NotFound`].
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Handler>, RegistryError> {
        self.get(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })
    }

    /// Check if a handler exists.
    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// All handler names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
