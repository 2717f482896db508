//! Domain layer: pure types shared by the parser, the runner and the plugin glue.
//!
//! - [`capability`] module categories and the actions each one may perform.
//! - [`tree`] the directory layout a workflow asks for, plus its plugin wire form.
//! - [`values`] user-supplied variable values for one run.

pub mod capability;
pub mod tree;
pub mod values;

pub use capability::{capabilities, check_capability, is_permitted, Category, ModuleAction};
pub use tree::{
    classify, flatten, from_wire, populate_content, FsNode, NodeKind, RenderFailure,
    TemplateDirective, TemplateFailurePolicy, WireNode,
};
pub use values::{RuntimeValue, RuntimeValues};
