//! # bootengine: a project bootstrapping engine
//!
//! `bootengine` reads a declarative workflow (YAML, JSON or TOML), collects
//! the variables it declares and then runs its steps in order. Every step is
//! carried out by a WebAssembly plugin running in a wasmtime sandbox:
//!
//! - **filer** plugins lay out files and folders inside the project root and
//!   may ask the host to render templates.
//! - **vcs** plugins initialise and manage version control in the project root.
//! - **cmd** plugins answer with a command line that the host runs after a
//!   safety check.
//! - **template_engine** plugins turn a template and the collected values into
//!   file content. They are only reached through the host.
//!
//! The `license` module is built in: it writes `LICENSE` from a bundled text.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use bootengine::{load_workflow, InMemoryModuleRegistry, PresetCollector, RuntimeValues, WorkflowRunner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let workflow = load_workflow(Path::new("bootengine.yaml")).unwrap();
//!     let registry = InMemoryModuleRegistry::from_json_file(Path::new("modules.json")).unwrap();
//!     let values = RuntimeValues::new().with("project_name", "demo").with("license", "mit");
//!     let report = WorkflowRunner::builder(workflow)
//!         .registry(Arc::new(registry))
//!         .collector(Arc::new(PresetCollector::new(values)))
//!         .build()
//!         .unwrap()
//!         .run()
//!         .await
//!         .unwrap();
//!     println!("{:?}", report.outcome);
//! }
//! ```

pub mod core;
pub mod domain;
pub mod dsl;
pub mod error;
pub mod exit_codes;
pub mod plugin;
pub mod registry;
pub mod security;

pub use crate::core::{
    BundledLicenses, Collected, Decision, DeclineReason, DirectoryLicenses, EngineConfig,
    LicenseProvider, PresetCollector, PromptCollector, RunOutcome, RunReport, StepReport,
    StopSignal, VariableCollector, WorkflowRunner, WorkflowRunnerBuilder,
};
pub use domain::{Category, FsNode, ModuleAction, RuntimeValue, RuntimeValues, WireNode};
pub use dsl::{default_workflow, load_workflow, parse_workflow, DslFormat, Step, Workflow};
pub use error::{StepError, WorkflowError};
pub use registry::{InMemoryModuleRegistry, ModuleRecord, ModuleRegistry};
