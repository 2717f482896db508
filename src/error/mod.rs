//! Error types for the engine.
//!
//! - [`StepError`] raised while executing a single workflow step.
//! - [`WorkflowError`] top-level errors for loading, validating and running a workflow.
//! - [`ErrorContext`] structured classification of a step error.

pub mod error_context;
pub mod step_error;
pub mod workflow_error;

pub use error_context::{ErrorClass, ErrorCode, ErrorContext};
pub use step_error::StepError;
pub use workflow_error::WorkflowError;

/// Convenience alias for workflow-level results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
/// Convenience alias for step-level results.
pub type StepResult<T> = Result<T, StepError>;
