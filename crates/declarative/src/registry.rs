//! Adapter registry - name to adapter lookup with lazy loading
//!
//! The registry is an explicit object built once at startup and handed to
//! the parser, rather than ambient global state. Adapters can be
//! registered eagerly, or as a loader that is run the first time the name
//! is looked up and cached afterwards.

use crate::adapter::AdapterRef;
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Constructor for an adapter that is loaded on first use
pub type Loader = Box<dyn Fn() -> anyhow::Result<AdapterRef> + Send + Sync>;

/// Thread-safe table of adapters by name
#[derive(Default)]
pub struct Registry {
    adapters: RwLock<BTreeMap<String, AdapterRef>>,
    loaders: RwLock<BTreeMap<String, Loader>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under a name, replacing any previous entry
    pub fn register(&self, name: &str, adapter: AdapterRef) -> Result<()> {
        validate_name(name)?;
        self.adapters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), adapter);
        Ok(())
    }

    /// Register a loader that builds the adapter on first lookup
    pub fn register_loader<F>(&self, name: &str, loader: F) -> Result<()>
    where
        F: Fn() -> anyhow::Result<AdapterRef> + Send + Sync + 'static,
    {
        validate_name(name)?;
        self.loaders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Box::new(loader));
        Ok(())
    }

    /// Look up an adapter, loading it if needed
    pub fn get(&self, name: &str) -> Result<AdapterRef> {
        if let Some(adapter) = self
            .adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(adapter.clone());
        }

        let loaded = self
            .loaders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|load| load());

        match loaded {
            Some(Ok(adapter)) => {
                log::debug!("Loaded adapter {}", name);
                let mut adapters = self.adapters.write().unwrap_or_else(PoisonError::into_inner);
                return Ok(adapters.entry(name.to_string()).or_insert(adapter).clone());
            }
            Some(Err(e)) => log::debug!("Failed to load adapter {}: {:#}", name, e),
            None => log::debug!("No adapter or loader registered for {}", name),
        }

        Err(Error::AdapterNotFound {
            name: name.to_string(),
            known: self.names(),
        })
    }

    /// Whether a name is registered or loadable
    pub fn contains(&self, name: &str) -> bool {
        self.adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
            || self
                .loaders
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(name)
    }

    /// All registered and loadable names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.extend(
            self.loaders
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .keys()
                .cloned(),
        );
        names.sort();
        names.dedup();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::type_error(
            "adapter name must be a non-empty string",
            &Value::from(name),
        ));
    }
    Ok(())
}
