use serde::{Deserialize, Serialize};

/// Stage of a step at which an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The workflow asked for something that is never allowed.
    Validation,
    /// A referenced module could not be found or used.
    Resolution,
    /// The plugin could not be turned into a running sandbox.
    Load,
    /// The plugin or a spawned command ran and failed.
    Execution,
}

/// Error classification code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Validation
    CapabilityDenied,
    CommandRejected,

    // Resolution
    ModuleNotFound,
    WrongCategory,
    RegistryUnavailable,

    // Plugin
    PluginLoadError,
    PluginExecutionError,
    PluginFailed,

    // Command
    CommandFailed,
    EmptyCommand,

    // Common
    Timeout,
    Cancelled,
    LicenseError,
    SerializationError,
    IoError,
}

/// Structured error context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    pub code: ErrorCode,
    pub class: ErrorClass,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
}

impl ErrorContext {
    pub fn new(code: ErrorCode, class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            code,
            class,
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, code: i64) -> Self {
        self.exit_code = Some(code);
        self
    }
}
