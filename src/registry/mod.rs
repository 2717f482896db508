//! Module registry: resolves the module names used in workflow steps.
//!
//! The engine only needs [`ModuleRegistry::lookup`]; installing and removing
//! modules is handled by whatever tool maintains the backing store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Category;

/// Where an installed module lives and what it is allowed to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
    #[serde(alias = "type")]
    pub category: Category,
    /// Path of the `.wasm` (or `.wat`) file.
    #[serde(alias = "path")]
    pub location: PathBuf,
}

impl ModuleRecord {
    pub fn new(name: impl Into<String>, category: Category, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            category,
            location: location.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Module not found: {0}")]
    NotFound(String),
    #[error("Registry load error: {0}")]
    Load(String),
}

pub trait ModuleRegistry: Send + Sync {
    fn lookup(&self, name: &str) -> Result<ModuleRecord, RegistryError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryModuleRegistry {
    modules: HashMap<String, ModuleRecord>,
}

impl InMemoryModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, record: ModuleRecord) {
        self.modules.insert(record.name.clone(), record);
    }

    pub fn with_module(mut self, record: ModuleRecord) -> Self {
        self.register(record);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Load a JSON array of records. Relative locations are resolved
    /// against the directory holding the file.
    pub fn from_json_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Load(format!("{}: {}", path.display(), e)))?;
        let records: Vec<ModuleRecord> = serde_json::from_str(&content)
            .map_err(|e| RegistryError::Load(format!("{}: {}", path.display(), e)))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut registry = Self::new();
        for mut record in records {
            if record.location.is_relative() {
                record.location = base.join(&record.location);
            }
            registry.register(record);
        }
        tracing::debug!(path = %path.display(), modules = registry.len(), "module registry loaded");
        Ok(registry)
    }
}

impl FromIterator<ModuleRecord> for InMemoryModuleRegistry {
    fn from_iter<T: IntoIterator<Item = ModuleRecord>>(iter: T) -> Self {
        let mut registry = Self::new();
        for record in iter {
            registry.register(record);
        }
        registry
    }
}

impl ModuleRegistry for InMemoryModuleRegistry {
    fn lookup(&self, name: &str) -> Result<ModuleRecord, RegistryError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}
