use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("WASM compilation error: {0}")]
    CompilationError(String),

    #[error("WASM instantiation error: {0}")]
    InstantiationError(String),

    #[error("Sandbox setup error: {0}")]
    SandboxError(String),

    #[error("WASM execution error: {0}")]
    ExecutionError(String),

    #[error("Missing export function: {0}")]
    MissingExport(String),

    #[error("Memory limit exceeded")]
    MemoryLimitExceeded,

    #[error("Fuel exhausted (instruction limit)")]
    FuelExhausted,

    #[error("Plugin call interrupted")]
    Interrupted,

    #[error("Output too large (max {max} bytes, got {actual} bytes)")]
    OutputTooLarge { max: usize, actual: usize },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PluginError {
    /// True when the module could not be turned into a runnable instance.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            PluginError::CompilationError(_)
                | PluginError::InstantiationError(_)
                | PluginError::SandboxError(_)
                | PluginError::IoError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_error_display() {
        assert!(PluginError::CompilationError("bad magic".into())
            .to_string()
            .contains("bad magic"));
        assert!(PluginError::MissingExport("init".into())
            .to_string()
            .contains("init"));
        let err = PluginError::OutputTooLarge { max: 8, actual: 16 };
        let msg = err.to_string();
        assert!(msg.contains('8'));
        assert!(msg.contains("16"));
    }

    #[test]
    fn test_load_error_classification() {
        assert!(PluginError::CompilationError("x".into()).is_load_error());
        assert!(PluginError::SandboxError("x".into()).is_load_error());
        assert!(!PluginError::ExecutionError("x".into()).is_load_error());
        assert!(!PluginError::Interrupted.is_load_error());
    }
}
