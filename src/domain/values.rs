use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value of one workflow variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuntimeValue {
    Text(String),
    /// Multi-select answer, de-duplicated in selection order.
    List(Vec<String>),
}

impl RuntimeValue {
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for item in items {
            let item = item.into();
            if !out.contains(&item) {
                out.push(item);
            }
        }
        RuntimeValue::List(out)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RuntimeValue::Text(s) => Some(s),
            RuntimeValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            RuntimeValue::List(items) => Some(items),
            RuntimeValue::Text(_) => None,
        }
    }

    /// Empty text or an empty list.
    pub fn is_blank(&self) -> bool {
        match self {
            RuntimeValue::Text(s) => s.trim().is_empty(),
            RuntimeValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for RuntimeValue {
    fn from(value: &str) -> Self {
        RuntimeValue::Text(value.to_string())
    }
}

impl From<String> for RuntimeValue {
    fn from(value: String) -> Self {
        RuntimeValue::Text(value)
    }
}

/// Variable values for one run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeValues(IndexMap<String, RuntimeValue>);

impl RuntimeValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<RuntimeValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RuntimeValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&RuntimeValue> {
        self.0.get(name)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(RuntimeValue::as_text)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RuntimeValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object handed to plugins as the `values` config entry.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| {
                    let v = match v {
                        RuntimeValue::Text(s) => serde_json::Value::String(s.clone()),
                        RuntimeValue::List(items) => serde_json::Value::Array(
                            items
                                .iter()
                                .cloned()
                                .map(serde_json::Value::String)
                                .collect(),
                        ),
                    };
                    (k.clone(), v)
                })
                .collect(),
        )
    }
}

impl FromIterator<(String, RuntimeValue)> for RuntimeValues {
    fn from_iter<T: IntoIterator<Item = (String, RuntimeValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_deduplicates_in_order() {
        let v = RuntimeValue::list(["serde", "tokio", "serde", "clap"]);
        assert_eq!(v.as_list().unwrap(), ["serde", "tokio", "clap"]);
        assert!(v.as_text().is_none());
    }

    #[test]
    fn test_json_keeps_declaration_order() {
        let values = RuntimeValues::new()
            .with("project_name", "demo")
            .with("deps", RuntimeValue::list(["a", "b"]))
            .with("author", "jane");
        assert_eq!(
            values.to_json().unwrap(),
            r#"{"project_name":"demo","deps":["a","b"],"author":"jane"}"#
        );
        assert_eq!(
            values.to_json_value(),
            serde_json::json!({"project_name": "demo", "deps": ["a", "b"], "author": "jane"})
        );
    }

    #[test]
    fn test_deserialize_untagged() {
        let values: RuntimeValues =
            serde_json::from_str(r#"{"name":"x","features":["web","db"]}"#).unwrap();
        assert_eq!(values.get_text("name"), Some("x"));
        assert_eq!(
            values.get("features"),
            Some(&RuntimeValue::List(vec!["web".into(), "db".into()]))
        );
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_blank() {
        assert!(RuntimeValue::from("  ").is_blank());
        assert!(RuntimeValue::List(vec![]).is_blank());
        assert!(!RuntimeValue::from("x").is_blank());
    }
}
