#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bootengine::{
    Category, EngineConfig, InMemoryModuleRegistry, ModuleRecord, PresetCollector, RuntimeValues,
    Workflow, WorkflowRunner,
};

/// Memory, bump allocator and a `$ret` helper that builds the 12-byte result
/// header `[exit_code, out_ptr, out_len]`.
const PRELUDE: &str = r#"
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 4096))
  (func $alloc (export "alloc") (param $size i32) (result i32)
    (local $addr i32)
    (local.set $addr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (local.get $size)))
    (local.get $addr))
  (func (export "dealloc") (param i32 i32))
  (func $ret (param $exit i32) (param $ptr i32) (param $len i32) (result i32)
    (local $h i32)
    (local.set $h (call $alloc (i32.const 12)))
    (i32.store (local.get $h) (local.get $exit))
    (i32.store offset=4 (local.get $h) (local.get $ptr))
    (i32.store offset=8 (local.get $h) (local.get $len))
    (local.get $h))
"#;

const CONFIG_GET_IMPORT: &str =
    r#"(import "bootengine" "config_get" (func $config_get (param i32 i32) (result i32 i32)))"#;
const RENDER_IMPORT: &str = r#"(import "bootengine" "render_template" (func $render (param i32 i32 i32 i32) (result i32 i32 i32)))"#;

/// Escape arbitrary text for a WAT data string.
pub fn wat_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'"' | b'\\' => out.push_str(&format!("\\{:02x}", byte)),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\{:02x}", byte)),
        }
    }
    out
}

/// Plugin whose `action` export always answers `exit_code` with `output`.
pub fn constant_plugin(action: &str, exit_code: u32, output: &str) -> String {
    format!(
        r#"(module{prelude}
  (data (i32.const 16) "{data}")
  (func (export "{action}") (param i32 i32) (result i32)
    (call $ret (i32.const {exit_code}) (i32.const 16) (i32.const {len}))))"#,
        prelude = PRELUDE,
        data = wat_escape(output),
        len = output.len(),
    )
}

/// Plugin whose `action` export spins until interrupted.
pub fn looping_plugin(action: &str) -> String {
    format!(
        r#"(module{prelude}
  (func (export "{action}") (param i32 i32) (result i32)
    (loop $spin (br $spin))
    (call $ret (i32.const 0) (i32.const 0) (i32.const 0))))"#,
        prelude = PRELUDE,
    )
}

/// Plugin answering `exit_code` with the host config value stored under `key`.
pub fn config_echo_plugin(action: &str, key: &str, exit_code: u32) -> String {
    format!(
        r#"(module
  {import}{prelude}
  (data (i32.const 16) "{key}")
  (func (export "{action}") (param i32 i32) (result i32)
    (local $ptr i32) (local $len i32)
    (call $config_get (i32.const 16) (i32.const {key_len}))
    (local.set $len)
    (local.set $ptr)
    (call $ret (i32.const {exit_code}) (local.get $ptr) (local.get $len))))"#,
        import = CONFIG_GET_IMPORT,
        prelude = PRELUDE,
        key = wat_escape(key),
        key_len = key.len(),
    )
}

/// Template engine returning its `{template, values}` input unchanged.
pub fn echo_engine() -> String {
    format!(
        r#"(module{prelude}
  (func (export "apply-template") (param $ptr i32) (param $len i32) (result i32)
    (call $ret (i32.const 0) (local.get $ptr) (local.get $len))))"#,
        prelude = PRELUDE,
    )
}

/// Plugin whose `action` export asks the host to render `template` with
/// `engine`. A rendered result is answered with `exit_on_success`, a refused
/// one with the callback status (1) and the host's error message.
pub fn rendering_plugin(action: &str, engine: &str, template: &str, exit_on_success: u32) -> String {
    format!(
        r#"(module
  {import}{prelude}
  (data (i32.const 16) "{engine}")
  (data (i32.const 512) "{template}")
  (func (export "{action}") (param i32 i32) (result i32)
    (local $status i32) (local $ptr i32) (local $len i32)
    (call $render (i32.const 16) (i32.const {engine_len}) (i32.const 512) (i32.const {template_len}))
    (local.set $len)
    (local.set $ptr)
    (local.set $status)
    (if (result i32) (i32.eqz (local.get $status))
      (then (call $ret (i32.const {exit_on_success}) (local.get $ptr) (local.get $len)))
      (else (call $ret (local.get $status) (local.get $ptr) (local.get $len))))))"#,
        import = RENDER_IMPORT,
        prelude = PRELUDE,
        engine = wat_escape(engine),
        engine_len = engine.len(),
        template = wat_escape(template),
        template_len = template.len(),
    )
}

/// Scratch directory holding plugin files and the project base directory.
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub registry: InMemoryModuleRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("plugins")).unwrap();
        Self {
            dir,
            registry: InMemoryModuleRegistry::new(),
        }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    /// Write `wat` to the plugin directory and register it as `name`.
    pub fn plugin(&mut self, name: &str, category: Category, wat: &str) -> PathBuf {
        let path = self.dir.path().join("plugins").join(format!("{}.wat", name));
        std::fs::write(&path, wat).unwrap();
        self.registry
            .register(ModuleRecord::new(name, category, &path));
        path
    }

    pub fn file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn runner(&self, workflow: Workflow, values: RuntimeValues) -> WorkflowRunner {
        self.runner_with_config(workflow, values, EngineConfig::default())
    }

    pub fn runner_with_config(
        &self,
        workflow: Workflow,
        values: RuntimeValues,
        config: EngineConfig,
    ) -> WorkflowRunner {
        WorkflowRunner::builder(workflow)
            .registry(Arc::new(self.registry.clone()))
            .collector(Arc::new(PresetCollector::new(values)))
            .config(config)
            .base_dir(self.base())
            .build()
            .unwrap()
    }
}
