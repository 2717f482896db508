//! Glue between workflow steps and the wasm plugin runtime.
//!
//! - [`PluginHost`] builds sandboxed [`PluginHandle`]s from registry records.
//! - [`TemplateBridge`] answers the `render_template` host call by running a
//!   template engine plugin one level deep.

pub mod bridge;
pub mod handle;

pub use bridge::{RenderError, TemplateBridge, MAX_CALLBACK_DEPTH};
pub use handle::{PluginHandle, PluginHost, CONFIG_FOLDER_STRUCT, CONFIG_VALUES};
