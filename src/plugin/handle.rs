use std::collections::HashMap;
use std::path::Path;

use bootengine_plugin_wasm::{
    HostBindings, Invocation, MountPoint, PluginError, PluginLimits, PluginManifest,
    PluginRuntime, SandboxPolicy, WasmEngine,
};

use crate::core::config::EngineConfig;
use crate::domain::Category;
use crate::registry::ModuleRecord;

/// Config key holding the JSON-encoded runtime values.
pub const CONFIG_VALUES: &str = "values";
/// Config key holding the JSON-encoded wire tree (filer plugins only).
pub const CONFIG_FOLDER_STRUCT: &str = "folder_struct";

/// Builds plugin handles that share one wasmtime engine.
#[derive(Clone)]
pub struct PluginHost {
    engine: WasmEngine,
    limits: PluginLimits,
    guest_mount: String,
}

impl PluginHost {
    pub fn new(engine: WasmEngine, config: &EngineConfig) -> Self {
        Self {
            engine,
            limits: config.plugin_limits(),
            guest_mount: config.sandbox_mount.clone(),
        }
    }

    pub fn engine(&self) -> &WasmEngine {
        &self.engine
    }

    /// Sandbox a workflow step gets for a module of `category`.
    ///
    /// filer and vcs see exactly one directory, the project root; filer can
    /// also ask the host to render templates.
    pub fn step_policy(&self, category: Category, project_root: &Path) -> SandboxPolicy {
        SandboxPolicy {
            mount: category
                .mounts_project_root()
                .then(|| MountPoint::new(project_root, self.guest_mount.clone())),
            template_callback: category == Category::Filer,
        }
    }

    /// Compile `record` and wrap it in a handle. Nothing runs yet.
    pub fn open(
        &self,
        record: &ModuleRecord,
        config: HashMap<String, String>,
        sandbox: SandboxPolicy,
    ) -> Result<PluginHandle, PluginError> {
        let manifest = PluginManifest::new(record.name.clone(), record.location.clone())
            .with_config(config)
            .with_sandbox(sandbox)
            .with_limits(self.limits.clone());
        let runtime = PluginRuntime::from_file(&self.engine, manifest)?;
        tracing::debug!(
            module = %record.name,
            category = %record.category,
            location = %record.location.display(),
            "plugin loaded"
        );
        Ok(PluginHandle {
            name: record.name.clone(),
            category: record.category,
            runtime,
            bindings: HostBindings::new(),
        })
    }
}

/// A loaded plugin, ready to run actions.
///
/// Every [`invoke`](PluginHandle::invoke) gets a fresh instance, so no guest
/// state survives between actions.
pub struct PluginHandle {
    name: String,
    category: Category,
    runtime: PluginRuntime,
    bindings: HostBindings,
}

impl PluginHandle {
    pub fn with_bindings(mut self, bindings: HostBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn sandbox(&self) -> &SandboxPolicy {
        &self.runtime.manifest().sandbox
    }

    pub fn invoke(&self, action: &str, payload: &[u8]) -> Result<Invocation, PluginError> {
        tracing::debug!(module = %self.name, action, payload_len = payload.len(), "invoking plugin");
        let result = self.runtime.call_action(action, payload, self.bindings.clone());
        match &result {
            Ok(out) => tracing::debug!(module = %self.name, action, exit_code = out.exit_code, "plugin returned"),
            Err(e) => tracing::warn!(module = %self.name, action, "plugin call failed: {}", e),
        }
        result
    }
}
