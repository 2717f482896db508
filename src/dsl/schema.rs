use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::{FsNode, ModuleAction};

/// Variable that names the project directory when `create_root` is set.
pub const PROJECT_NAME_VAR: &str = "project_name";
/// Fallback name of the license variable.
pub const LICENSE_VAR: &str = "license";
/// Module name handled by the host instead of a plugin.
pub const LICENSE_MODULE: &str = "license";

// ================================
// Workflow DSL Schema
// ================================

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Workflow {
    #[serde(default)]
    pub config: WorkflowConfig,
    #[serde(default)]
    pub vars: IndexMap<String, VariableDef>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_struct: Option<Vec<FsNode>>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Create `<base>/<project_name>` and run steps inside it.
    #[serde(default)]
    pub create_root: bool,
    /// Skip the command safety gate for `cmd` steps.
    #[serde(default)]
    pub unrestricted: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Password,
    License,
    Select,
    #[serde(alias = "multi-select", alias = "multi_select")]
    Multi,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VariableDef {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub required: bool,
    /// Allowed answers for `select` and `multi`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Prompt text shown by interactive collectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VariableDef {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            required: false,
            options: Vec::new(),
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub module: String,
    pub action: ModuleAction,
    /// Working directory for `cmd` steps, relative to the base directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl Step {
    pub fn new(name: impl Into<String>, module: impl Into<String>, action: ModuleAction) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            action,
            cwd: None,
            params: Vec::new(),
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl Workflow {
    /// The tree needs an explicit go-ahead when no step will create it.
    pub fn requires_tree_confirmation(&self) -> bool {
        self.folder_struct.is_some()
            && !self
                .steps
                .iter()
                .any(|s| s.action == ModuleAction::CreateFolderStruct)
    }

    /// Name of the variable holding the license choice.
    pub fn license_variable(&self) -> &str {
        self.vars
            .iter()
            .find(|(_, def)| def.value_type == ValueType::License)
            .map(|(name, _)| name.as_str())
            .unwrap_or(LICENSE_VAR)
    }
}

/// Starter workflow written by `bootengine init`.
pub fn default_workflow() -> Workflow {
    let mut vars = IndexMap::new();
    vars.insert(
        PROJECT_NAME_VAR.to_string(),
        VariableDef::new(ValueType::String).required(),
    );
    vars.insert(
        LICENSE_VAR.to_string(),
        VariableDef::new(ValueType::License).required(),
    );
    Workflow {
        config: WorkflowConfig {
            create_root: true,
            unrestricted: false,
        },
        vars,
        steps: vec![
            Step::new("git init", "git", ModuleAction::Init),
            Step::new(
                "create folder structure",
                "filer",
                ModuleAction::CreateFolderStruct,
            ),
        ],
        folder_struct: Some(vec![FsNode::file(".gitignore"), FsNode::file("README.md")]),
    }
}
