// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Backend registry for managing quantum backends.
//!
//! Calibration runs pick their backend by name from the registry, or take
//! the default one.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::{BackendType, QuantumBackend};
use crate::error::{BackendError, Error, Result};

/// Thread-safe registry of named backends.
#[derive(Default)]
pub struct BackendRegistry {
    /// Registered backends
    backends: RwLock<HashMap<String, Arc<dyn QuantumBackend>>>,

    /// Default backend name
    default_backend: RwLock<Option<String>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend.
    ///
    /// If a backend with the same name already exists, it will be replaced.
    /// The first registered backend becomes the default.
    pub fn register(&self, backend: Arc<dyn QuantumBackend>) {
        let name = backend.name().to_string();
        info!(backend = %name, "Registering backend");

        self.backends.write().insert(name.clone(), backend);

        let mut default = self.default_backend.write();
        if default.is_none() {
            debug!(backend = %name, "Setting as default backend");
            *default = Some(name);
        }
    }

    /// Get a backend by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn QuantumBackend>> {
        self.backends
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Backend(BackendError::NotFound(name.to_string())))
    }

    /// Get a backend by name, or the default if name is None.
    pub fn get_or_default(&self, name: Option<&str>) -> Result<Arc<dyn QuantumBackend>> {
        match name {
            Some(n) => self.get(n),
            None => {
                let default = self.default_backend.read().clone();
                match default {
                    Some(n) => self.get(&n),
                    None => Err(Error::Backend(BackendError::NotFound(
                        "No default backend configured".to_string(),
                    ))),
                }
            }
        }
    }

    /// List all backends with their types, sorted by name.
    pub fn list_with_types(&self) -> Vec<(String, BackendType)> {
        let mut list: Vec<_> = self
            .backends
            .read()
            .iter()
            .map(|(name, backend)| (name.clone(), backend.backend_type()))
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }

    pub fn len(&self) -> usize {
        self.backends.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the default backend name.
    pub fn default_backend_name(&self) -> Option<String> {
        self.default_backend.read().clone()
    }
}
