//! Security layer: the command safety gate applied to `cmd` plugin output.
//!
//! Plugin isolation is handled by the sandbox in `bootengine-plugin-wasm`.

pub mod command_gate;

pub use command_gate::{CommandGate, DEFAULT_DENYLIST};
