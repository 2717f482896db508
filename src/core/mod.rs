//! Run orchestration: configuration, variable collection, licenses,
//! command execution and the workflow runner itself.

pub mod collector;
pub mod config;
pub mod license;
pub mod process;
pub mod runner;
pub mod stop_signal;

pub use collector::{validate_values, Collected, Decision, PresetCollector, PromptCollector, VariableCollector};
pub use config::EngineConfig;
pub use license::{render_license, BundledLicenses, DirectoryLicenses, LicenseError, LicenseProvider, LICENSES};
pub use process::{run_command, split_command};
pub use runner::{
    DeclineReason, RunOutcome, RunReport, RunState, StepReport, WorkflowRunner,
    WorkflowRunnerBuilder,
};
pub use stop_signal::StopSignal;
