//! Workflow-level error types.

use std::path::PathBuf;

use thiserror::Error;

use super::StepError;

/// Workflow-level errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow parse error: {0}")]
    ParseError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Missing variable: {0}")]
    MissingVariable(String),
    #[error("Invalid value for variable '{name}': {reason}")]
    InvalidVariable { name: String, reason: String },
    #[error("Variable collection failed: {0}")]
    CollectorError(String),
    #[error("Failed to create project root {}: {source}", path.display())]
    RootCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Template render failed for {file}: {message}")]
    TemplateRender { file: String, message: String },
    #[error("Step '{step}' ({module}:{action}) failed: {error}")]
    StepFailed {
        step: String,
        module: String,
        action: String,
        error: Box<StepError>,
    },
    #[error("Workflow cancelled")]
    Cancelled,
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl WorkflowError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            WorkflowError::Cancelled => crate::exit_codes::CANCELLED,
            _ => crate::exit_codes::FAILURE,
        }
    }

    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            WorkflowError::StepFailed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Name of the step that failed, if any.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            WorkflowError::StepFailed { step, .. } => Some(step),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(e: serde_json::Error) -> Self {
        WorkflowError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_error_display() {
        let err = WorkflowError::StepFailed {
            step: "commit".into(),
            module: "git".into(),
            action: "commit".into(),
            error: Box::new(StepError::PluginFailed {
                exit_code: 1,
                message: "nothing to commit".into(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("'commit'"));
        assert!(msg.contains("git:commit"));
        assert!(msg.contains("nothing to commit"));
        assert_eq!(err.failed_step(), Some("commit"));
        assert!(err.step_error().is_some());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(WorkflowError::Cancelled.exit_code(), 130);
        assert_eq!(
            WorkflowError::MissingVariable("project_name".into()).exit_code(),
            1
        );
    }

    #[test]
    fn test_root_creation_display() {
        let err = WorkflowError::RootCreation {
            path: PathBuf::from("/tmp/demo"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/demo"));
    }
}
