use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use wasmtime::{Engine, Linker, Module, Store, StoreLimitsBuilder, Trap};
use wasmtime_wasi::{preview1, DirPerms, FilePerms, WasiCtxBuilder};

use super::error::PluginError;
use super::host_functions::{register_host_functions, HostBindings, PluginState};
use super::manifest::PluginManifest;

/// Size of the result header returned by every action export.
pub const RESULT_HEADER_LEN: usize = 12;

const WASM_PAGE_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum PluginStatus {
    Loaded,
    Running,
    Ready,
    Error(String),
}

/// Shared wasmtime engine.
///
/// Epoch interruption is always on: every store gets a deadline of one tick,
/// so [`WasmEngine::interrupt`] traps whatever guest code is running.
#[derive(Clone)]
pub struct WasmEngine {
    engine: Engine,
}

impl WasmEngine {
    pub fn new() -> Result<Self, PluginError> {
        let mut cfg = wasmtime::Config::new();
        cfg.consume_fuel(true);
        cfg.epoch_interruption(true);
        let engine = Engine::new(&cfg).map_err(|e| PluginError::CompilationError(e.to_string()))?;
        Ok(Self { engine })
    }

    /// Trap every guest currently executing on this engine.
    pub fn interrupt(&self) {
        self.engine.increment_epoch();
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

/// Result of one action call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub exit_code: u32,
    pub output: Vec<u8>,
}

impl Invocation {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Plugin runtime instance
pub struct PluginRuntime {
    manifest: PluginManifest,
    config: Arc<HashMap<String, String>>,
    engine: Engine,
    module: Module,
    linker: Linker<PluginState>,
    status: Arc<RwLock<PluginStatus>>,
}

impl PluginRuntime {
    pub fn new(
        engine: &WasmEngine,
        manifest: PluginManifest,
        wasm_bytes: &[u8],
    ) -> Result<Self, PluginError> {
        let module = Module::new(&engine.engine, wasm_bytes)
            .map_err(|e| PluginError::CompilationError(e.to_string()))?;

        let mut linker = Linker::new(&engine.engine);
        preview1::add_to_linker_sync(&mut linker, |state: &mut PluginState| &mut state.wasi)
            .map_err(|e: anyhow::Error| PluginError::InstantiationError(e.to_string()))?;
        register_host_functions(&mut linker, manifest.sandbox.template_callback)?;

        Ok(Self {
            config: Arc::new(manifest.config.clone()),
            manifest,
            engine: engine.engine.clone(),
            module,
            linker,
            status: Arc::new(RwLock::new(PluginStatus::Loaded)),
        })
    }

    /// Load the module from `manifest.wasm_path` (`.wat` text is accepted).
    pub fn from_file(engine: &WasmEngine, manifest: PluginManifest) -> Result<Self, PluginError> {
        let bytes = crate::read_wasm_bytes(&manifest.wasm_path)?;
        Self::new(engine, manifest, &bytes)
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    pub fn status(&self) -> PluginStatus {
        self.status
            .read()
            .map(|s| s.clone())
            .unwrap_or(PluginStatus::Error("Status lock poisoned".into()))
    }

    fn set_status(&self, status: PluginStatus) {
        if let Ok(mut guard) = self.status.write() {
            *guard = status;
        }
    }

    /// Call the export named `action` with `payload` in a fresh instance.
    pub fn call_action(
        &self,
        action: &str,
        payload: &[u8],
        bindings: HostBindings,
    ) -> Result<Invocation, PluginError> {
        self.set_status(PluginStatus::Running);
        let result = self.call_action_inner(action, payload, bindings);
        match &result {
            Ok(_) => self.set_status(PluginStatus::Ready),
            Err(e) => self.set_status(PluginStatus::Error(e.to_string())),
        }
        result
    }

    fn build_state(&self, bindings: HostBindings) -> Result<PluginState, PluginError> {
        let mut wasi = WasiCtxBuilder::new();
        if let Some(mount) = &self.manifest.sandbox.mount {
            wasi.preopened_dir(
                &mount.host_dir,
                &mount.guest_path,
                DirPerms::all(),
                FilePerms::all(),
            )
            .map_err(|e| {
                PluginError::SandboxError(format!(
                    "cannot mount {} at {}: {}",
                    mount.host_dir.display(),
                    mount.guest_path,
                    e
                ))
            })?;
        }

        let limits = StoreLimitsBuilder::new()
            .memory_size(self.manifest.limits.max_memory_pages as usize * WASM_PAGE_SIZE)
            .build();
        let mut state = PluginState::new(self.manifest.name.clone(), wasi.build_p1())
            .with_config(self.config.clone())
            .with_bindings(bindings);
        state.limits = limits;
        Ok(state)
    }

    fn call_action_inner(
        &self,
        action: &str,
        payload: &[u8],
        bindings: HostBindings,
    ) -> Result<Invocation, PluginError> {
        let state = self.build_state(bindings)?;
        let mut store = Store::new(&self.engine, state);
        store.limiter(|s| &mut s.limits);
        store
            .set_fuel(self.manifest.limits.max_fuel.unwrap_or(u64::MAX))
            .map_err(|e: anyhow::Error| PluginError::ExecutionError(e.to_string()))?;
        store.set_epoch_deadline(1);

        let instance = self
            .linker
            .instantiate(&mut store, &self.module)
            .map_err(|e| PluginError::InstantiationError(e.to_string()))?;

        // WASI reactors need their constructors run before any export is used.
        if let Ok(initialize) = instance.get_typed_func::<(), ()>(&mut store, "_initialize") {
            initialize
                .call(&mut store, ())
                .map_err(map_wasm_error)?;
        }

        if let Ok(init) = instance.get_typed_func::<(), i32>(&mut store, "plugin_init") {
            let code = init.call(&mut store, ()).map_err(map_wasm_error)?;
            if code != 0 {
                return Err(PluginError::ExecutionError(format!(
                    "plugin_init failed: {}",
                    code
                )));
            }
        }

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| PluginError::MissingExport("memory".into()))?;
        let alloc = instance
            .get_typed_func::<i32, i32>(&mut store, "alloc")
            .map_err(|_| PluginError::MissingExport("alloc".into()))?;
        let dealloc = instance
            .get_typed_func::<(i32, i32), ()>(&mut store, "dealloc")
            .map_err(|_| PluginError::MissingExport("dealloc".into()))?;
        let handler = instance
            .get_typed_func::<(i32, i32), i32>(&mut store, action)
            .map_err(|_| PluginError::MissingExport(action.to_string()))?;

        let input_len = i32::try_from(payload.len()).map_err(|_| {
            PluginError::SerializationError(format!("payload of {} bytes", payload.len()))
        })?;
        let input_ptr = if payload.is_empty() {
            0
        } else {
            let ptr = alloc
                .call(&mut store, input_len)
                .map_err(map_wasm_error)?;
            memory
                .write(&mut store, ptr as usize, payload)
                .map_err(|e| PluginError::ExecutionError(e.to_string()))?;
            ptr
        };

        let result_ptr = handler
            .call(&mut store, (input_ptr, input_len))
            .map_err(map_wasm_error)?;

        let mut header = [0u8; RESULT_HEADER_LEN];
        memory
            .read(&store, result_ptr as usize, &mut header)
            .map_err(|e| PluginError::ExecutionError(e.to_string()))?;
        let exit_code = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let out_ptr = i32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let out_len = i32::from_le_bytes([header[8], header[9], header[10], header[11]]);
        if out_ptr < 0 || out_len < 0 {
            return Err(PluginError::ExecutionError(format!(
                "invalid result buffer ({}, {})",
                out_ptr, out_len
            )));
        }
        let out_len = out_len as usize;
        if out_len > self.manifest.limits.max_output_bytes {
            return Err(PluginError::OutputTooLarge {
                max: self.manifest.limits.max_output_bytes,
                actual: out_len,
            });
        }

        let mut output = vec![0u8; out_len];
        memory
            .read(&store, out_ptr as usize, &mut output)
            .map_err(|e| PluginError::ExecutionError(e.to_string()))?;

        if !payload.is_empty() {
            let _ = dealloc.call(&mut store, (input_ptr, input_len));
        }
        let _ = dealloc.call(&mut store, (out_ptr, out_len as i32));
        let _ = dealloc.call(&mut store, (result_ptr, RESULT_HEADER_LEN as i32));

        if let Ok(destroy) = instance.get_typed_func::<(), ()>(&mut store, "plugin_destroy") {
            let _ = destroy.call(&mut store, ());
        }

        Ok(Invocation { exit_code, output })
    }
}

fn map_wasm_error(err: anyhow::Error) -> PluginError {
    if let Some(trap) = err.downcast_ref::<Trap>() {
        match trap {
            Trap::OutOfFuel => return PluginError::FuelExhausted,
            Trap::Interrupt => return PluginError::Interrupted,
            _ => {}
        }
    }
    let msg = format!("{:#}", err);
    if msg.to_lowercase().contains("memory") && msg.to_lowercase().contains("limit") {
        PluginError::MemoryLimitExceeded
    } else {
        PluginError::ExecutionError(msg)
    }
}
