use std::path::Path;
use std::time::Duration;

use bootengine_plugin_wasm::{PluginLimits, DEFAULT_GUEST_MOUNT};
use serde::{Deserialize, Serialize};

pub use crate::domain::TemplateFailurePolicy;
use crate::error::WorkflowError;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound for one plugin invocation. Each template render of the
    /// folder tree gets its own bound.
    #[serde(default = "default_plugin_timeout_secs")]
    pub plugin_timeout_secs: u64,
    /// Upper bound for one command produced by a `cmd` plugin.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default)]
    pub template_failure_policy: TemplateFailurePolicy,
    /// Guest path the project root is mounted at for filer and vcs plugins.
    #[serde(default = "default_sandbox_mount")]
    pub sandbox_mount: String,
    #[serde(default = "default_max_memory_pages")]
    pub max_memory_pages: u32,
    #[serde(default)]
    pub max_fuel: Option<u64>,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_plugin_timeout_secs() -> u64 {
    60
}

fn default_command_timeout_secs() -> u64 {
    600
}

fn default_sandbox_mount() -> String {
    DEFAULT_GUEST_MOUNT.to_string()
}

fn default_max_memory_pages() -> u32 {
    PluginLimits::default().max_memory_pages
}

fn default_max_output_bytes() -> usize {
    PluginLimits::default().max_output_bytes
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            plugin_timeout_secs: default_plugin_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
            template_failure_policy: TemplateFailurePolicy::default(),
            sandbox_mount: default_sandbox_mount(),
            max_memory_pages: default_max_memory_pages(),
            max_fuel: None,
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, WorkflowError> {
        toml::from_str(content).map_err(|e| WorkflowError::ConfigError(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, WorkflowError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WorkflowError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn plugin_timeout(&self) -> Duration {
        Duration::from_secs(self.plugin_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn plugin_limits(&self) -> PluginLimits {
        PluginLimits {
            max_memory_pages: self.max_memory_pages,
            max_fuel: self.max_fuel,
            max_output_bytes: self.max_output_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.plugin_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.command_timeout(), Duration::from_secs(600));
        assert_eq!(cfg.template_failure_policy, TemplateFailurePolicy::Continue);
        assert_eq!(cfg.sandbox_mount, "/app");
        assert_eq!(cfg.plugin_limits(), PluginLimits::default());
    }

    #[test]
    fn test_partial_toml() {
        let cfg = EngineConfig::from_toml_str(
            r#"
plugin_timeout_secs = 5
template_failure_policy = "abort"
max_fuel = 1000000
"#,
        )
        .unwrap();
        assert_eq!(cfg.plugin_timeout_secs, 5);
        assert_eq!(cfg.command_timeout_secs, 600);
        assert_eq!(cfg.template_failure_policy, TemplateFailurePolicy::Abort);
        assert_eq!(cfg.plugin_limits().max_fuel, Some(1_000_000));
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_bad_toml() {
        let err = EngineConfig::from_toml_str("plugin_timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, WorkflowError::ConfigError(_)));
    }
}
