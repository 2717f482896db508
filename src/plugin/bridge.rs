use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bootengine_plugin_wasm::{
    HostBindings, PluginError, RenderRequest, SandboxPolicy, TemplateRenderer,
};
use serde::Serialize;
use thiserror::Error;

use super::handle::{PluginHost, CONFIG_VALUES};
use crate::domain::{Category, ModuleAction, RuntimeValues, TemplateDirective};
use crate::registry::{ModuleRegistry, RegistryError};

/// Deepest callback level allowed to render. Depth 0 is a workflow step; a
/// template engine started by the bridge runs at depth 1 and may not call back.
pub const MAX_CALLBACK_DEPTH: u32 = 1;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template callback nesting exceeded (depth {depth}, max {max})")]
    DepthExceeded { depth: u32, max: u32 },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("module '{module}' is a {category} module, not a template engine")]
    NotTemplateEngine { module: String, category: Category },
    #[error("cannot read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("template engine error: {0}")]
    Plugin(#[from] PluginError),
    #[error("template engine exited with code {exit_code}: {message}")]
    Failed { exit_code: u32, message: String },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ApplyTemplateInput<'a> {
    template: &'a str,
    values: &'a RuntimeValues,
}

/// Host side of `render_template`.
#[derive(Clone)]
pub struct TemplateBridge {
    registry: Arc<dyn ModuleRegistry>,
    host: PluginHost,
    values: Arc<RuntimeValues>,
    /// Relative template paths are resolved against this directory.
    template_dir: PathBuf,
}

impl TemplateBridge {
    pub fn new(
        registry: Arc<dyn ModuleRegistry>,
        host: PluginHost,
        values: Arc<RuntimeValues>,
        template_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            host,
            values,
            template_dir: template_dir.into(),
        }
    }

    /// Render `template_path` with the engine module named `engine`, on
    /// behalf of a caller running at `depth`.
    pub fn render(
        &self,
        engine: &str,
        template_path: &str,
        depth: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if depth >= MAX_CALLBACK_DEPTH {
            return Err(RenderError::DepthExceeded {
                depth,
                max: MAX_CALLBACK_DEPTH,
            });
        }

        let record = self.registry.lookup(engine)?;
        if record.category != Category::TemplateEngine {
            return Err(RenderError::NotTemplateEngine {
                module: record.name,
                category: record.category,
            });
        }

        let path = self.resolve(template_path);
        let template = std::fs::read_to_string(&path)
            .map_err(|source| RenderError::TemplateRead { path: path.clone(), source })?;

        let mut config = HashMap::new();
        config.insert(CONFIG_VALUES.to_string(), self.values.to_json()?);
        // The engine gets no filesystem, and any callback it attempts is
        // answered with an error status at depth + 1.
        let sandbox = SandboxPolicy {
            mount: None,
            template_callback: true,
        };
        let nested = HostBindings::new()
            .with_renderer(Arc::new(self.clone()))
            .at_depth(depth + 1);
        let handle = self
            .host
            .open(&record, config, sandbox)?
            .with_bindings(nested);

        let payload = serde_json::to_vec(&ApplyTemplateInput {
            template: &template,
            values: &self.values,
        })?;
        tracing::debug!(engine, template = %path.display(), depth, "applying template");
        let out = handle.invoke(ModuleAction::ApplyTemplate.as_str(), &payload)?;
        if out.is_success() {
            Ok(out.output)
        } else {
            Err(RenderError::Failed {
                exit_code: out.exit_code,
                message: out.output_text(),
            })
        }
    }

    /// Render function for the directory tree, run from the host at depth 0.
    pub fn render_directive(&self, directive: &TemplateDirective) -> Result<Vec<u8>, String> {
        self.render(&directive.engine, &directive.filepath, 0)
            .map_err(|e| e.to_string())
    }

    fn resolve(&self, template_path: &str) -> PathBuf {
        let path = Path::new(template_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.template_dir.join(path)
        }
    }
}

impl TemplateRenderer for TemplateBridge {
    fn render(&self, request: &RenderRequest<'_>) -> Result<Vec<u8>, String> {
        TemplateBridge::render(self, request.engine, request.template_path, request.depth)
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::registry::{InMemoryModuleRegistry, ModuleRecord};
    use bootengine_plugin_wasm::WasmEngine;

    /// Engine that returns its raw input, i.e. the `{template, values}` JSON.
    const ECHO_ENGINE_WAT: &str = r#"(module
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 1024))
  (func $alloc (export "alloc") (param $size i32) (result i32)
    (local $addr i32)
    (local.set $addr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (local.get $size)))
    (local.get $addr))
  (func (export "dealloc") (param i32 i32))
  (func (export "apply-template") (param $ptr i32) (param $len i32) (result i32)
    (local $header i32)
    (local.set $header (call $alloc (i32.const 12)))
    (i32.store (local.get $header) (i32.const 0))
    (i32.store offset=4 (local.get $header) (local.get $ptr))
    (i32.store offset=8 (local.get $header) (local.get $len))
    (local.get $header)))"#;

    fn bridge(dir: &Path) -> TemplateBridge {
        let engine_path = dir.join("echo-engine.wat");
        std::fs::write(&engine_path, ECHO_ENGINE_WAT).unwrap();
        std::fs::write(dir.join("readme.tpl"), "# {{ project_name }}").unwrap();

        let registry = InMemoryModuleRegistry::new()
            .with_module(ModuleRecord::new(
                "echo",
                Category::TemplateEngine,
                &engine_path,
            ))
            .with_module(ModuleRecord::new("git", Category::Vcs, &engine_path));
        let host = PluginHost::new(WasmEngine::new().unwrap(), &EngineConfig::default());
        let values = RuntimeValues::new().with("project_name", "demo");
        TemplateBridge::new(Arc::new(registry), host, Arc::new(values), dir)
    }

    #[test]
    fn test_render_passes_template_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge(dir.path());
        let out = bridge.render("echo", "readme.tpl", 0).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["template"], "# {{ project_name }}");
        assert_eq!(json["values"]["project_name"], "demo");
    }

    #[test]
    fn test_render_rejects_nested_depth() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge(dir.path());
        let err = bridge.render("echo", "readme.tpl", 1).unwrap_err();
        assert!(matches!(err, RenderError::DepthExceeded { depth: 1, max: 1 }));
    }

    #[test]
    fn test_render_requires_template_engine() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge(dir.path());
        let err = bridge.render("git", "readme.tpl", 0).unwrap_err();
        assert!(matches!(err, RenderError::NotTemplateEngine { .. }));

        let err = bridge.render("tera", "readme.tpl", 0).unwrap_err();
        assert!(matches!(err, RenderError::Registry(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_render_missing_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge(dir.path());
        let err = bridge.render("echo", "nope.tpl", 0).unwrap_err();
        assert!(matches!(err, RenderError::TemplateRead { .. }));
        assert!(err.to_string().contains("nope.tpl"));
    }

    #[test]
    fn test_render_directive() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge(dir.path());
        let directive = TemplateDirective {
            engine: "echo".into(),
            filepath: dir.path().join("readme.tpl").display().to_string(),
        };
        assert!(bridge.render_directive(&directive).is_ok());
    }
}
