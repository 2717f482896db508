//! Variable collection and confirmation prompts.
//!
//! The runner never prompts by itself: it asks a [`VariableCollector`] and
//! acts on the explicit [`Decision`] / [`Collected`] it gets back.

use std::io::{BufRead, Write};
use std::sync::Mutex;

use indexmap::IndexMap;

use super::license::LICENSES;
use crate::domain::{RuntimeValue, RuntimeValues};
use crate::dsl::{ValueType, VariableDef};
use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Decline,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Collected {
    Values(RuntimeValues),
    Declined,
}

pub trait VariableCollector: Send + Sync {
    /// Ask for a yes/no go-ahead.
    fn confirm(&self, message: &str) -> Result<Decision, WorkflowError>;

    /// Gather a value for each declared variable, in declaration order.
    fn collect(&self, vars: &IndexMap<String, VariableDef>) -> Result<Collected, WorkflowError>;
}

/// Answers from values known up front (command line, tests).
#[derive(Debug, Clone)]
pub struct PresetCollector {
    values: RuntimeValues,
    confirm: Decision,
}

impl PresetCollector {
    pub fn new(values: RuntimeValues) -> Self {
        Self {
            values,
            confirm: Decision::Proceed,
        }
    }

    pub fn with_confirm(mut self, decision: Decision) -> Self {
        self.confirm = decision;
        self
    }
}

impl VariableCollector for PresetCollector {
    fn confirm(&self, message: &str) -> Result<Decision, WorkflowError> {
        tracing::debug!(decision = ?self.confirm, "{}", message);
        Ok(self.confirm)
    }

    fn collect(&self, vars: &IndexMap<String, VariableDef>) -> Result<Collected, WorkflowError> {
        // declared variables first, in declaration order, then any extras
        let mut out = RuntimeValues::new();
        for name in vars.keys() {
            if let Some(value) = self.values.get(name) {
                out.insert(name.clone(), value.clone());
            }
        }
        for (name, value) in self.values.iter() {
            if !out.contains(name) {
                out.insert(name.clone(), value.clone());
            }
        }
        Ok(Collected::Values(out))
    }
}

/// Line-based prompts on any reader/writer pair (stdin/stderr in the binary).
///
/// Variables already present in `presets` are not asked for. An empty answer
/// leaves the variable unset; typing `!q` declines.
pub struct PromptCollector<R, W> {
    io: Mutex<(R, W)>,
    presets: RuntimeValues,
}

const QUIT: &str = "!q";

impl<R: BufRead, W: Write> PromptCollector<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
            presets: RuntimeValues::new(),
        }
    }

    pub fn with_presets(mut self, presets: RuntimeValues) -> Self {
        self.presets = presets;
        self
    }

    fn ask(&self, prompt: &str) -> Result<Option<String>, WorkflowError> {
        let mut guard = self
            .io
            .lock()
            .map_err(|_| WorkflowError::CollectorError("prompt lock poisoned".into()))?;
        let (reader, writer) = &mut *guard;
        write!(writer, "{} ", prompt).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        let mut line = String::new();
        let read = reader.read_line(&mut line).map_err(io_err)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt_for(&self, name: &str, def: &VariableDef) -> Result<Prompted, WorkflowError> {
        let title = def
            .description
            .clone()
            .unwrap_or_else(|| format!("what is your {} ?", name));
        let choices: Vec<String> = match def.value_type {
            ValueType::License if def.options.is_empty() => {
                LICENSES.iter().map(|(id, _, _)| id.to_string()).collect()
            }
            _ => def.options.clone(),
        };
        let prompt = if choices.is_empty() {
            title
        } else {
            format!("{} [{}]", title, choices.join(", "))
        };

        let Some(answer) = self.ask(&prompt)? else {
            return Ok(Prompted::Declined);
        };
        if answer == QUIT {
            return Ok(Prompted::Declined);
        }
        if answer.is_empty() {
            return Ok(Prompted::Skipped);
        }
        let value = match def.value_type {
            ValueType::Multi => {
                RuntimeValue::list(answer.split(',').map(str::trim).filter(|s| !s.is_empty()))
            }
            _ => RuntimeValue::Text(answer),
        };
        Ok(Prompted::Value(value))
    }
}

enum Prompted {
    Value(RuntimeValue),
    Skipped,
    Declined,
}

fn io_err(e: std::io::Error) -> WorkflowError {
    WorkflowError::CollectorError(e.to_string())
}

impl<R, W> VariableCollector for PromptCollector<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn confirm(&self, message: &str) -> Result<Decision, WorkflowError> {
        let answer = self.ask(&format!("{} [y/N]", message))?;
        Ok(match answer.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("y") | Some("yes") => Decision::Proceed,
            _ => Decision::Decline,
        })
    }

    fn collect(&self, vars: &IndexMap<String, VariableDef>) -> Result<Collected, WorkflowError> {
        let mut out = RuntimeValues::new();
        for (name, def) in vars {
            if let Some(preset) = self.presets.get(name) {
                out.insert(name.clone(), preset.clone());
                continue;
            }
            match self.prompt_for(name, def)? {
                Prompted::Value(value) => out.insert(name.clone(), value),
                Prompted::Skipped => {}
                Prompted::Declined => return Ok(Collected::Declined),
            }
        }
        Ok(Collected::Values(out))
    }
}

/// Check collected values against their declarations.
pub fn validate_values(
    vars: &IndexMap<String, VariableDef>,
    values: &RuntimeValues,
) -> Result<(), WorkflowError> {
    for (name, def) in vars {
        let Some(value) = values.get(name) else {
            if def.required {
                return Err(WorkflowError::MissingVariable(name.clone()));
            }
            continue;
        };
        if def.required && value.is_blank() {
            return Err(WorkflowError::MissingVariable(name.clone()));
        }
        let invalid = |reason: String| WorkflowError::InvalidVariable {
            name: name.clone(),
            reason,
        };
        match (def.value_type, value) {
            (ValueType::Multi, RuntimeValue::List(items)) => {
                if !def.options.is_empty() {
                    if let Some(bad) = items.iter().find(|i| !def.options.contains(i)) {
                        return Err(invalid(format!("'{}' is not one of the options", bad)));
                    }
                }
            }
            (ValueType::Multi, RuntimeValue::Text(_)) => {
                return Err(invalid("expected a list of values".into()));
            }
            (_, RuntimeValue::List(_)) => {
                return Err(invalid("expected a single value".into()));
            }
            (ValueType::Select, RuntimeValue::Text(text)) => {
                if !def.options.is_empty() && !def.options.contains(text) {
                    return Err(invalid(format!("'{}' is not one of the options", text)));
                }
            }
            (ValueType::License, RuntimeValue::Text(text)) => {
                let known = if def.options.is_empty() {
                    LICENSES.iter().any(|(id, _, _)| *id == text.as_str())
                } else {
                    def.options.contains(text)
                };
                if !known && !text.is_empty() {
                    return Err(invalid(format!("unknown license '{}'", text)));
                }
            }
            (ValueType::String | ValueType::Password, RuntimeValue::Text(_)) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn vars() -> IndexMap<String, VariableDef> {
        let mut vars = IndexMap::new();
        vars.insert(
            "project_name".to_string(),
            VariableDef::new(ValueType::String).required(),
        );
        vars.insert(
            "db".to_string(),
            VariableDef::new(ValueType::Select).with_options(["postgres", "sqlite"]),
        );
        vars.insert(
            "features".to_string(),
            VariableDef::new(ValueType::Multi).with_options(["web", "cli"]),
        );
        vars.insert("license".to_string(), VariableDef::new(ValueType::License));
        vars
    }

    #[test]
    fn test_preset_collect_orders_declared_first() {
        let presets = RuntimeValues::new()
            .with("extra", "x")
            .with("db", "sqlite")
            .with("project_name", "demo");
        let collected = PresetCollector::new(presets).collect(&vars()).unwrap();
        let Collected::Values(values) = collected else {
            panic!("declined")
        };
        let keys: Vec<_> = values.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["project_name", "db", "extra"]);
    }

    #[test]
    fn test_preset_confirm() {
        let c = PresetCollector::new(RuntimeValues::new());
        assert_eq!(c.confirm("go?").unwrap(), Decision::Proceed);
        let c = c.with_confirm(Decision::Decline);
        assert_eq!(c.confirm("go?").unwrap(), Decision::Decline);
    }

    #[test]
    fn test_prompt_collector() {
        let input = "demo\nsqlite\nweb, cli, web\nmit\n";
        let mut output = Vec::new();
        {
            let collector = PromptCollector::new(Cursor::new(input), &mut output);
            let Collected::Values(values) = collector.collect(&vars()).unwrap() else {
                panic!("declined")
            };
            assert_eq!(values.get_text("project_name"), Some("demo"));
            assert_eq!(
                values.get("features"),
                Some(&RuntimeValue::List(vec!["web".into(), "cli".into()]))
            );
            assert_eq!(values.get_text("license"), Some("mit"));
        }
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("what is your project_name ?"));
        assert!(shown.contains("[postgres, sqlite]"));
        assert!(shown.contains("unlicense"));
    }

    #[test]
    fn test_prompt_collector_presets_and_decline() {
        let collector = PromptCollector::new(Cursor::new("!q\n"), Vec::new())
            .with_presets(RuntimeValues::new().with("project_name", "demo"));
        assert_eq!(collector.collect(&vars()).unwrap(), Collected::Declined);

        let collector = PromptCollector::new(Cursor::new("yes\n"), Vec::new());
        assert_eq!(collector.confirm("create tree?").unwrap(), Decision::Proceed);
        let collector = PromptCollector::new(Cursor::new(""), Vec::new());
        assert_eq!(collector.confirm("create tree?").unwrap(), Decision::Decline);
    }

    #[test]
    fn test_validate_values() {
        let vars = vars();
        let ok = RuntimeValues::new()
            .with("project_name", "demo")
            .with("db", "postgres")
            .with("features", RuntimeValue::list(["web"]))
            .with("license", "mit");
        assert!(validate_values(&vars, &ok).is_ok());

        let missing = RuntimeValues::new().with("db", "postgres");
        assert!(matches!(
            validate_values(&vars, &missing),
            Err(WorkflowError::MissingVariable(ref n)) if n == "project_name"
        ));

        let blank = RuntimeValues::new().with("project_name", " ");
        assert!(matches!(
            validate_values(&vars, &blank),
            Err(WorkflowError::MissingVariable(_))
        ));

        let bad_option = ok.clone().with("db", "mysql");
        assert!(matches!(
            validate_values(&vars, &bad_option),
            Err(WorkflowError::InvalidVariable { ref name, .. }) if name == "db"
        ));

        let wrong_shape = ok.clone().with("features", "web");
        assert!(validate_values(&vars, &wrong_shape).is_err());

        let bad_license = ok.with("license", "wtfpl");
        assert!(validate_values(&vars, &bad_license).is_err());
    }

    #[test]
    fn test_license_options_restrict_choice() {
        let mut vars = IndexMap::new();
        vars.insert(
            "license".to_string(),
            VariableDef::new(ValueType::License).with_options(["mit", "apache2"]),
        );
        let allowed = RuntimeValues::new().with("license", "apache2");
        assert!(validate_values(&vars, &allowed).is_ok());
        let outside = RuntimeValues::new().with("license", "unlicense");
        assert!(matches!(
            validate_values(&vars, &outside),
            Err(WorkflowError::InvalidVariable { ref name, .. }) if name == "license"
        ));

        let mut output = Vec::new();
        {
            let collector = PromptCollector::new(Cursor::new("mit\n"), &mut output);
            let Collected::Values(values) = collector.collect(&vars).unwrap() else {
                panic!("declined")
            };
            assert_eq!(values.get_text("license"), Some("mit"));
        }
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("[mit, apache2]"));
        assert!(!shown.contains("unlicense"));
    }
}
