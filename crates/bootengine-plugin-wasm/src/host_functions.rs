use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use wasmtime::{Caller, Linker, Memory, StoreLimits, StoreLimitsBuilder};

use super::error::PluginError;

/// Host module name
pub const HOST_MODULE: &str = "bootengine";

/// `render_template` status for rendered bytes.
pub const RENDER_OK: i32 = 0;
/// `render_template` status for an error message.
pub const RENDER_ERR: i32 = 1;

/// One `render_template` call as seen by the host.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub engine: &'a str,
    pub template_path: &'a str,
    /// Callback nesting level of the guest that issued the call.
    pub depth: u32,
}

/// Host side of the `render_template` import.
///
/// `Err` carries a message that is handed back to the guest as the error
/// payload; it never aborts the calling plugin.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, request: &RenderRequest<'_>) -> Result<Vec<u8>, String>;
}

/// Host objects handed to one invocation.
#[derive(Clone, Default)]
pub struct HostBindings {
    pub renderer: Option<Arc<dyn TemplateRenderer>>,
    pub call_depth: u32,
}

impl HostBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn at_depth(mut self, depth: u32) -> Self {
        self.call_depth = depth;
        self
    }
}

/// Runtime state for each plugin invocation
pub struct PluginState {
    pub wasi: wasmtime_wasi::preview1::WasiP1Ctx,
    pub config: Arc<HashMap<String, String>>,
    pub renderer: Option<Arc<dyn TemplateRenderer>>,
    pub call_depth: u32,
    pub limits: StoreLimits,
    pub plugin_id: String,
}

impl PluginState {
    pub fn new(plugin_id: String, wasi: wasmtime_wasi::preview1::WasiP1Ctx) -> Self {
        Self {
            wasi,
            config: Arc::new(HashMap::new()),
            renderer: None,
            call_depth: 0,
            limits: StoreLimitsBuilder::new().build(),
            plugin_id,
        }
    }

    pub fn with_config(mut self, config: Arc<HashMap<String, String>>) -> Self {
        self.config = config;
        self
    }

    pub fn with_bindings(mut self, bindings: HostBindings) -> Self {
        self.renderer = bindings.renderer;
        self.call_depth = bindings.call_depth;
        self
    }
}

/// Register host functions into linker
pub fn register_host_functions(
    linker: &mut Linker<PluginState>,
    template_callback: bool,
) -> Result<(), PluginError> {
    linker
        .func_wrap(HOST_MODULE, "config_get", config_get_impl)
        .map_err(|e| PluginError::InstantiationError(e.to_string()))?;
    linker
        .func_wrap(HOST_MODULE, "log", log_impl)
        .map_err(|e| PluginError::InstantiationError(e.to_string()))?;
    if template_callback {
        linker
            .func_wrap(HOST_MODULE, "render_template", render_template_impl)
            .map_err(|e| PluginError::InstantiationError(e.to_string()))?;
    }
    Ok(())
}

fn get_memory(caller: &mut Caller<'_, PluginState>) -> Result<Memory> {
    caller
        .get_export("memory")
        .and_then(|e| e.into_memory())
        .ok_or_else(|| anyhow!("Missing export: memory"))
}

fn read_bytes(caller: &mut Caller<'_, PluginState>, ptr: i32, len: i32) -> Result<Vec<u8>> {
    if ptr < 0 || len < 0 {
        return Err(anyhow!("invalid guest buffer ({ptr}, {len})"));
    }
    let memory = get_memory(caller)?;
    let mut buf = vec![0u8; len as usize];
    memory
        .read(caller, ptr as usize, &mut buf)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(buf)
}

fn read_string(caller: &mut Caller<'_, PluginState>, ptr: i32, len: i32) -> Result<String> {
    let bytes = read_bytes(caller, ptr, len)?;
    String::from_utf8(bytes).map_err(|e| anyhow!("guest string is not UTF-8: {e}"))
}

fn alloc_in_guest(caller: &mut Caller<'_, PluginState>, size: i32) -> Result<i32> {
    let alloc = caller
        .get_export("alloc")
        .and_then(|e| e.into_func())
        .ok_or_else(|| anyhow!("Missing export: alloc"))?;
    let alloc = alloc
        .typed::<i32, i32>(&mut *caller)
        .map_err(|e| anyhow!(e.to_string()))?;
    alloc.call(caller, size)
}

fn write_to_guest(caller: &mut Caller<'_, PluginState>, bytes: &[u8]) -> Result<(i32, i32)> {
    let len = i32::try_from(bytes.len()).map_err(|_| anyhow!("host buffer too large"))?;
    let ptr = alloc_in_guest(caller, len)?;
    let memory = get_memory(caller)?;
    memory
        .write(caller, ptr as usize, bytes)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok((ptr, len))
}

fn config_get_impl(
    mut caller: Caller<'_, PluginState>,
    key_ptr: i32,
    key_len: i32,
) -> Result<(i32, i32)> {
    let key = read_string(&mut caller, key_ptr, key_len)?;
    let value = caller.data().config.get(&key).cloned();
    match value {
        Some(value) => write_to_guest(&mut caller, value.as_bytes()),
        None => Ok((0, -1)),
    }
}

fn log_impl(
    mut caller: Caller<'_, PluginState>,
    level: i32,
    msg_ptr: i32,
    msg_len: i32,
) -> Result<()> {
    let msg_bytes = read_bytes(&mut caller, msg_ptr, msg_len)?;
    let msg = String::from_utf8_lossy(&msg_bytes);
    let prefix = &caller.data().plugin_id;
    match level {
        0 => tracing::trace!("[plugin:{}] {}", prefix, msg),
        1 => tracing::debug!("[plugin:{}] {}", prefix, msg),
        2 => tracing::info!("[plugin:{}] {}", prefix, msg),
        3 => tracing::warn!("[plugin:{}] {}", prefix, msg),
        _ => tracing::error!("[plugin:{}] {}", prefix, msg),
    }
    Ok(())
}

fn render_template_impl(
    mut caller: Caller<'_, PluginState>,
    engine_ptr: i32,
    engine_len: i32,
    path_ptr: i32,
    path_len: i32,
) -> Result<(i32, i32, i32)> {
    let engine = read_string(&mut caller, engine_ptr, engine_len)?;
    let template_path = read_string(&mut caller, path_ptr, path_len)?;
    let depth = caller.data().call_depth;
    let renderer = caller.data().renderer.clone();

    let result = match renderer {
        Some(renderer) => renderer.render(&RenderRequest {
            engine: &engine,
            template_path: &template_path,
            depth,
        }),
        None => Err("template rendering is not available to this plugin".to_string()),
    };

    let (status, payload) = match result {
        Ok(bytes) => (RENDER_OK, bytes),
        Err(message) => {
            tracing::warn!(
                plugin = %caller.data().plugin_id,
                engine = %engine,
                template = %template_path,
                "render_template failed: {}",
                message
            );
            (RENDER_ERR, message.into_bytes())
        }
    };
    let (ptr, len) = write_to_guest(&mut caller, &payload)?;
    Ok((status, ptr, len))
}
