//! wasmtime host for bootengine plugins.
//!
//! A plugin is a core WebAssembly module that exports `memory`, `alloc`,
//! `dealloc` and one function per action. Each action takes `(ptr, len)` of
//! the input payload and returns a pointer to a 12-byte little-endian header
//! `[exit_code: u32, out_ptr: i32, out_len: i32]`. A non-zero exit code means
//! the output bytes are an error message.
//!
//! Host imports live under the [`HOST_MODULE`] namespace:
//!
//! | import | signature |
//! |--------|-----------|
//! | `config_get` | `(key_ptr, key_len) -> (ptr, len)`, `len == -1` when unset |
//! | `log` | `(level, ptr, len)` |
//! | `render_template` | `(engine_ptr, engine_len, path_ptr, path_len) -> (status, ptr, len)` |

pub mod error;
pub mod host_functions;
pub mod manifest;
pub mod runtime;

use std::path::Path;

pub use error::PluginError;
pub use host_functions::{
    HostBindings, PluginState, RenderRequest, TemplateRenderer, HOST_MODULE, RENDER_ERR,
    RENDER_OK,
};
pub use manifest::{MountPoint, PluginLimits, PluginManifest, SandboxPolicy, DEFAULT_GUEST_MOUNT};
pub use runtime::{Invocation, PluginRuntime, PluginStatus, WasmEngine, RESULT_HEADER_LEN};

pub fn parse_wat_str(source: &str) -> Result<Vec<u8>, PluginError> {
    wat::parse_str(source).map_err(|e| PluginError::CompilationError(e.to_string()))
}

pub fn read_wasm_bytes(path: &Path) -> Result<Vec<u8>, PluginError> {
    let bytes = std::fs::read(path)?;
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if ext.eq_ignore_ascii_case("wat") {
            let text = String::from_utf8_lossy(&bytes);
            return parse_wat_str(&text);
        }
    }
    Ok(bytes)
}
