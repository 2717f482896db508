use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StepError;

/// Kind of work a plugin module does. Fixed per module in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cmd,
    Filer,
    Vcs,
    TemplateEngine,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cmd => "cmd",
            Category::Filer => "filer",
            Category::Vcs => "vcs",
            Category::TemplateEngine => "template_engine",
        }
    }

    /// Categories whose plugins see the project root through a preopen.
    pub fn mounts_project_root(&self) -> bool {
        matches!(self, Category::Filer | Category::Vcs)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cmd" => Ok(Category::Cmd),
            "filer" => Ok(Category::Filer),
            "vcs" => Ok(Category::Vcs),
            "template_engine" | "template-engine" => Ok(Category::TemplateEngine),
            other => Err(format!("unknown module category: {}", other)),
        }
    }
}

/// Operation a step asks a module to perform.
///
/// The serialized form is also the name of the export the plugin must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleAction {
    Init,
    Commit,
    Push,
    Add,
    AddOrigin,
    InstallLocalDeps,
    InstallGlobalDeps,
    InstallDevDeps,
    CreateFile,
    CreateFolder,
    WriteFile,
    CreateFolderStruct,
    ApplyTemplate,
}

impl ModuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleAction::Init => "init",
            ModuleAction::Commit => "commit",
            ModuleAction::Push => "push",
            ModuleAction::Add => "add",
            ModuleAction::AddOrigin => "add-origin",
            ModuleAction::InstallLocalDeps => "install-local-deps",
            ModuleAction::InstallGlobalDeps => "install-global-deps",
            ModuleAction::InstallDevDeps => "install-dev-deps",
            ModuleAction::CreateFile => "create-file",
            ModuleAction::CreateFolder => "create-folder",
            ModuleAction::WriteFile => "write-file",
            ModuleAction::CreateFolderStruct => "create-folder-struct",
            ModuleAction::ApplyTemplate => "apply-template",
        }
    }
}

impl fmt::Display for ModuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ACTIONS
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown action: {}", s))
    }
}

const ALL_ACTIONS: &[ModuleAction] = &[
    ModuleAction::Init,
    ModuleAction::Commit,
    ModuleAction::Push,
    ModuleAction::Add,
    ModuleAction::AddOrigin,
    ModuleAction::InstallLocalDeps,
    ModuleAction::InstallGlobalDeps,
    ModuleAction::InstallDevDeps,
    ModuleAction::CreateFile,
    ModuleAction::CreateFolder,
    ModuleAction::WriteFile,
    ModuleAction::CreateFolderStruct,
    ModuleAction::ApplyTemplate,
];

const VCS_ACTIONS: &[ModuleAction] = &[
    ModuleAction::Init,
    ModuleAction::Commit,
    ModuleAction::Push,
    ModuleAction::Add,
    ModuleAction::AddOrigin,
];

const CMD_ACTIONS: &[ModuleAction] = &[
    ModuleAction::Init,
    ModuleAction::InstallLocalDeps,
    ModuleAction::InstallGlobalDeps,
    ModuleAction::InstallDevDeps,
];

const FILER_ACTIONS: &[ModuleAction] = &[
    ModuleAction::CreateFile,
    ModuleAction::CreateFolder,
    ModuleAction::WriteFile,
    ModuleAction::CreateFolderStruct,
];

const TEMPLATE_ENGINE_ACTIONS: &[ModuleAction] = &[ModuleAction::ApplyTemplate];

/// Actions a module of `category` may be asked to perform.
pub fn capabilities(category: Category) -> &'static [ModuleAction] {
    match category {
        Category::Vcs => VCS_ACTIONS,
        Category::Cmd => CMD_ACTIONS,
        Category::Filer => FILER_ACTIONS,
        Category::TemplateEngine => TEMPLATE_ENGINE_ACTIONS,
    }
}

pub fn is_permitted(category: Category, action: ModuleAction) -> bool {
    capabilities(category).contains(&action)
}

pub fn check_capability(category: Category, action: ModuleAction) -> Result<(), StepError> {
    if is_permitted(category, action) {
        Ok(())
    } else {
        Err(StepError::CapabilityViolation { category, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_table() {
        assert!(is_permitted(Category::Vcs, ModuleAction::AddOrigin));
        assert!(is_permitted(Category::Cmd, ModuleAction::Init));
        assert!(is_permitted(Category::Filer, ModuleAction::CreateFolderStruct));
        assert!(is_permitted(
            Category::TemplateEngine,
            ModuleAction::ApplyTemplate
        ));

        assert!(!is_permitted(Category::Vcs, ModuleAction::WriteFile));
        assert!(!is_permitted(Category::Cmd, ModuleAction::Push));
        assert!(!is_permitted(Category::Filer, ModuleAction::Init));
        assert!(!is_permitted(Category::TemplateEngine, ModuleAction::Init));
    }

    #[test]
    fn test_every_action_belongs_somewhere() {
        for action in ALL_ACTIONS {
            let owners = [
                Category::Cmd,
                Category::Filer,
                Category::Vcs,
                Category::TemplateEngine,
            ]
            .into_iter()
            .filter(|c| is_permitted(*c, *action))
            .count();
            assert!(owners >= 1, "{} has no category", action);
        }
    }

    #[test]
    fn test_check_capability_error() {
        let err = check_capability(Category::Cmd, ModuleAction::Commit).unwrap_err();
        assert!(matches!(
            err,
            StepError::CapabilityViolation {
                category: Category::Cmd,
                action: ModuleAction::Commit
            }
        ));
        assert!(err.to_string().contains("commit"));
    }

    #[test]
    fn test_serde_names() {
        let action: ModuleAction = serde_json::from_str(r#""install-dev-deps""#).unwrap();
        assert_eq!(action, ModuleAction::InstallDevDeps);
        assert_eq!(
            serde_json::to_string(&ModuleAction::AddOrigin).unwrap(),
            r#""add-origin""#
        );
        let category: Category = serde_json::from_str(r#""template_engine""#).unwrap();
        assert_eq!(category, Category::TemplateEngine);
    }

    #[test]
    fn test_from_str_matches_serde() {
        for action in ALL_ACTIONS {
            let parsed: ModuleAction = action.as_str().parse().unwrap();
            assert_eq!(parsed, *action);
            let json = serde_json::to_string(action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
        assert!("deploy".parse::<ModuleAction>().is_err());
        assert_eq!("vcs".parse::<Category>().unwrap(), Category::Vcs);
    }
}
