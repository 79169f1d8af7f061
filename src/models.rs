// src/models.rs

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

// --- Core value model ---
// Settings, parsed flag values and rendered command tokens all flow through
// this one tagged type so conversion and rendering rules live in one place.

/// A dynamically-typed configuration value.
///
/// Carried by settings and parsed arguments, and rendered into command
/// tokens when a task is emitted. Serializes untagged so manifests stay
/// plain JSON (`3`, `"ws"`, `[5, 50, 500]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    /// Renders this value as command-line tokens: one token per list
    /// element, `"true"`/`"false"` for booleans, plain string conversion
    /// otherwise.
    pub fn render(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.iter().flat_map(Value::render).collect(),
            Self::Bool(b) => vec![if *b { "true" } else { "false" }.to_string()],
            Self::Str(s) => vec![s.clone()],
            Self::Int(n) => vec![n.to_string()],
            Self::Float(f) => vec![f.to_string()],
        }
    }

    /// Returns the underlying string if this is a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Loose truthiness used by skip predicates and condition branches.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

// --- Configuration maps ---

/// The authoritative name -> value map for setting base values.
///
/// Layered at startup: TOML file entries first, then flag-supplied values
/// on top. Settings read from it exactly once, during `apply_settings`.
#[derive(Debug, Clone, Default)]
pub struct SettingsMap {
    values: HashMap<String, Value>,
}

impl SettingsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The post-parse attribute map: every flag value captured from the command
/// line, keyed by its canonical attribute name.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    values: HashMap<String, Value>,
}

impl ParsedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Boolean attribute lookup; absent attributes read as `false`.
    pub fn get_flag(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(Value::truthy)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

// --- Emitted task record ---

/// One fully-resolved unit of work handed to a task sink.
///
/// Dependency sets are `BTreeSet`s: multiple arguments may reference the
/// same path or setting name, and the external executor keys caching on
/// these sets, so they must be deduplicated and deterministically ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Task {
    pub tokens: Vec<String>,
    pub inputs: BTreeSet<PathBuf>,
    pub outputs: BTreeSet<PathBuf>,
    pub settings: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_scalars() {
        assert_eq!(Value::from("ws").render(), vec!["ws"]);
        assert_eq!(Value::from(42i64).render(), vec!["42"]);
        assert_eq!(Value::from(0.5f64).render(), vec!["0.5"]);
        assert_eq!(Value::from(true).render(), vec!["true"]);
        assert_eq!(Value::from(false).render(), vec!["false"]);
    }

    #[test]
    fn render_list_yields_one_token_per_element() {
        let v = Value::List(vec![Value::Int(5), Value::Int(50), Value::Int(500)]);
        assert_eq!(v.render(), vec!["5", "50", "500"]);
    }

    #[test]
    fn truthiness() {
        assert!(Value::from(true).truthy());
        assert!(!Value::from(false).truthy());
        assert!(!Value::from(0i64).truthy());
        assert!(Value::from(1i64).truthy());
        assert!(!Value::from("").truthy());
        assert!(Value::from("x").truthy());
        assert!(!Value::List(vec![]).truthy());
    }

    #[test]
    fn parsed_args_flag_defaults_to_false() {
        let mut args = ParsedArgs::new();
        assert!(!args.get_flag("train"));
        args.insert("train", Value::Bool(true));
        assert!(args.get_flag("train"));
    }

    #[test]
    fn task_serializes_sorted_deduplicated_sets() {
        let mut task = Task::default();
        task.tokens.push("watershed".to_string());
        task.inputs.insert(PathBuf::from("b.png"));
        task.inputs.insert(PathBuf::from("a.png"));
        task.inputs.insert(PathBuf::from("a.png"));
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains(r#"["a.png","b.png"]"#));
    }
}
