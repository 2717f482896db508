//! Workflow parser: converts raw YAML/JSON/TOML text into a [`Workflow`].

use std::path::Path;

use super::schema::Workflow;
use super::validator::validate_workflow;
use crate::error::WorkflowError;

/// Supported workflow file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DslFormat {
    /// YAML format (`.yaml` / `.yml`).
    Yaml,
    /// JSON format (`.json`).
    Json,
    /// TOML format (`.toml`).
    Toml,
}

impl DslFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(DslFormat::Yaml),
            "json" => Some(DslFormat::Json),
            "toml" => Some(DslFormat::Toml),
            _ => None,
        }
    }
}

/// Parse and validate workflow content.
pub fn parse_workflow(content: &str, format: DslFormat) -> Result<Workflow, WorkflowError> {
    let workflow: Workflow = match format {
        DslFormat::Yaml => serde_saphyr::from_str(content)
            .map_err(|e| WorkflowError::ParseError(e.to_string()))?,
        DslFormat::Json => serde_json::from_str(content)
            .map_err(|e| WorkflowError::ParseError(e.to_string()))?,
        DslFormat::Toml => {
            // Go through serde_json::Value so the untagged tree literals see
            // the same data model as the other formats.
            let toml_val: toml::Value =
                toml::from_str(content).map_err(|e| WorkflowError::ParseError(e.to_string()))?;
            serde_json::from_value(toml_value_to_json(toml_val))
                .map_err(|e| WorkflowError::ParseError(e.to_string()))?
        }
    };
    validate_workflow(&workflow)?;
    Ok(workflow)
}

/// Read a workflow file; the format comes from the extension, YAML otherwise.
pub fn load_workflow(path: &Path) -> Result<Workflow, WorkflowError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        WorkflowError::ParseError(format!("cannot read {}: {}", path.display(), e))
    })?;
    let format = DslFormat::from_path(path).unwrap_or(DslFormat::Yaml);
    tracing::debug!(path = %path.display(), ?format, "loading workflow");
    parse_workflow(&content, format)
}

fn toml_value_to_json(val: toml::Value) -> serde_json::Value {
    match val {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_value_to_json).collect())
        }
        toml::Value::Table(tbl) => serde_json::Value::Object(
            tbl.into_iter()
                .map(|(k, v)| (k, toml_value_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
    }
}
