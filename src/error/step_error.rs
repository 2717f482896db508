use std::time::Duration;

use bootengine_plugin_wasm::PluginError;
use thiserror::Error;

use super::{ErrorClass, ErrorCode, ErrorContext};
use crate::core::license::LicenseError;
use crate::domain::{Category, ModuleAction};
use crate::registry::RegistryError;

/// Step-level errors
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Action '{action}' is not permitted for {category} modules")]
    CapabilityViolation {
        category: Category,
        action: ModuleAction,
    },
    #[error("Module not found: {0}")]
    ModuleNotFound(String),
    #[error("Module registry error: {0}")]
    Registry(String),
    #[error("Module '{module}' is a {category} module and cannot be used here")]
    WrongCategory { module: String, category: Category },
    #[error("Plugin load error: {0}")]
    Load(PluginError),
    #[error("Plugin execution error: {0}")]
    Execution(PluginError),
    #[error("Plugin exited with code {exit_code}: {message}")]
    PluginFailed { exit_code: u32, message: String },
    #[error("Command rejected by safety gate: {0}")]
    CommandRejected(String),
    #[error("Command '{command}' failed: {status}")]
    CommandFailed { command: String, status: String },
    #[error("Failed to spawn '{command}': {source}")]
    CommandSpawn {
        command: String,
        source: std::io::Error,
    },
    #[error("Plugin returned an empty command")]
    EmptyCommand,
    #[error("Timeout: step exceeded {0:?}")]
    Timeout(Duration),
    #[error("Step cancelled")]
    Cancelled,
    #[error("License error: {0}")]
    License(#[from] LicenseError),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PluginError> for StepError {
    fn from(e: PluginError) -> Self {
        if e.is_load_error() {
            StepError::Load(e)
        } else {
            StepError::Execution(e)
        }
    }
}

impl From<RegistryError> for StepError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(name) => StepError::ModuleNotFound(name),
            RegistryError::Load(msg) => StepError::Registry(msg),
        }
    }
}

impl From<serde_json::Error> for StepError {
    fn from(e: serde_json::Error) -> Self {
        StepError::Serialization(e.to_string())
    }
}

impl StepError {
    pub fn error_context(&self) -> ErrorContext {
        let (code, class) = match self {
            StepError::CapabilityViolation { .. } => {
                (ErrorCode::CapabilityDenied, ErrorClass::Validation)
            }
            StepError::CommandRejected(_) => (ErrorCode::CommandRejected, ErrorClass::Validation),
            StepError::ModuleNotFound(_) => (ErrorCode::ModuleNotFound, ErrorClass::Resolution),
            StepError::WrongCategory { .. } => (ErrorCode::WrongCategory, ErrorClass::Resolution),
            StepError::Registry(_) => (ErrorCode::RegistryUnavailable, ErrorClass::Resolution),
            StepError::Load(_) => (ErrorCode::PluginLoadError, ErrorClass::Load),
            StepError::Execution(_) => (ErrorCode::PluginExecutionError, ErrorClass::Execution),
            StepError::PluginFailed { .. } => (ErrorCode::PluginFailed, ErrorClass::Execution),
            StepError::CommandFailed { .. } | StepError::CommandSpawn { .. } => {
                (ErrorCode::CommandFailed, ErrorClass::Execution)
            }
            StepError::EmptyCommand => (ErrorCode::EmptyCommand, ErrorClass::Execution),
            StepError::Timeout(_) => (ErrorCode::Timeout, ErrorClass::Execution),
            StepError::Cancelled => (ErrorCode::Cancelled, ErrorClass::Execution),
            StepError::License(_) => (ErrorCode::LicenseError, ErrorClass::Execution),
            StepError::Serialization(_) => (ErrorCode::SerializationError, ErrorClass::Execution),
            StepError::Io(_) => (ErrorCode::IoError, ErrorClass::Execution),
        };
        let ctx = ErrorContext::new(code, class, self.to_string());
        match self {
            StepError::PluginFailed { exit_code, .. } => ctx.with_exit_code(*exit_code as i64),
            _ => ctx,
        }
    }
}
