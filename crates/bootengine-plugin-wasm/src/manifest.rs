use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Guest directory the project root is mounted at unless configured otherwise.
pub const DEFAULT_GUEST_MOUNT: &str = "/app";

/// Everything needed to load one plugin module into a sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    pub wasm_path: PathBuf,
    /// Flat configuration readable by the guest through `config_get`.
    #[serde(default)]
    pub config: HashMap<String, String>,
    #[serde(default)]
    pub sandbox: SandboxPolicy,
    #[serde(default)]
    pub limits: PluginLimits,
}

impl PluginManifest {
    pub fn new(name: impl Into<String>, wasm_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            wasm_path: wasm_path.into(),
            config: HashMap::new(),
            sandbox: SandboxPolicy::default(),
            limits: PluginLimits::default(),
        }
    }

    pub fn with_config(mut self, config: HashMap<String, String>) -> Self {
        self.config = config;
        self
    }

    pub fn with_sandbox(mut self, sandbox: SandboxPolicy) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_limits(mut self, limits: PluginLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// What the guest is allowed to reach outside its own linear memory.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SandboxPolicy {
    /// Single read-write host directory visible to the guest.
    #[serde(default)]
    pub mount: Option<MountPoint>,
    /// Links the `render_template` host function.
    #[serde(default)]
    pub template_callback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MountPoint {
    pub host_dir: PathBuf,
    pub guest_path: String,
}

impl MountPoint {
    pub fn new(host_dir: impl Into<PathBuf>, guest_path: impl Into<String>) -> Self {
        Self {
            host_dir: host_dir.into(),
            guest_path: guest_path.into(),
        }
    }
}

/// Per-invocation resource limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginLimits {
    /// Max linear memory pages (64KB per page)
    #[serde(default = "default_max_memory_pages")]
    pub max_memory_pages: u32,
    /// Instruction budget, unlimited when unset
    #[serde(default)]
    pub max_fuel: Option<u64>,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_max_memory_pages() -> u32 {
    256
}

fn default_max_output_bytes() -> usize {
    4 * 1024 * 1024
}

impl Default for PluginLimits {
    fn default() -> Self {
        Self {
            max_memory_pages: default_max_memory_pages(),
            max_fuel: None,
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_defaults() {
        let manifest = PluginManifest::new("git", "/plugins/git.wasm");
        assert_eq!(manifest.name, "git");
        assert!(manifest.config.is_empty());
        assert_eq!(manifest.sandbox, SandboxPolicy::default());
        assert_eq!(manifest.limits.max_memory_pages, 256);
        assert!(manifest.limits.max_fuel.is_none());
    }

    #[test]
    fn test_manifest_deserialize_partial() {
        let manifest: PluginManifest = serde_json::from_str(
            r#"{"name":"filer","wasm_path":"filer.wasm","sandbox":{"mount":{"host_dir":"demo","guest_path":"/app"},"template_callback":true}}"#,
        )
        .unwrap();
        assert_eq!(
            manifest.sandbox.mount,
            Some(MountPoint::new("demo", DEFAULT_GUEST_MOUNT))
        );
        assert!(manifest.sandbox.template_callback);
        assert_eq!(manifest.limits, PluginLimits::default());
    }
}
