use super::schema::{ValueType, Workflow};
use crate::core::license::asset_name;
use crate::error::WorkflowError;

/// Static checks that do not need a registry or user input.
pub fn validate_workflow(workflow: &Workflow) -> Result<(), WorkflowError> {
    for (index, step) in workflow.steps.iter().enumerate() {
        if step.name.trim().is_empty() {
            return Err(WorkflowError::ParseError(format!(
                "Step #{} has an empty name",
                index + 1
            )));
        }
        if step.module.trim().is_empty() {
            return Err(WorkflowError::ParseError(format!(
                "Step '{}' has an empty module",
                step.name
            )));
        }
    }

    for (name, def) in &workflow.vars {
        if name.trim().is_empty() {
            return Err(WorkflowError::ParseError("Variable with an empty name".into()));
        }
        let takes_options = matches!(
            def.value_type,
            ValueType::Select | ValueType::Multi | ValueType::License
        );
        if !def.options.is_empty() && !takes_options {
            return Err(WorkflowError::ParseError(format!(
                "Variable '{}' declares options but is not a select",
                name
            )));
        }
        // A license choice narrows the known set, it cannot extend it.
        if def.value_type == ValueType::License {
            if let Some(unknown) = def.options.iter().find(|id| asset_name(id).is_none()) {
                return Err(WorkflowError::ParseError(format!(
                    "Variable '{}' offers unknown license '{}'",
                    name, unknown
                )));
            }
        }
    }

    Ok(())
}
