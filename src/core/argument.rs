// src/core/argument.rs

use crate::core::flags::FlagRegistry;
use crate::core::paths::{self, PathError};
use crate::models::{ParsedArgs, SettingsMap, Value};
use clap::builder::{PossibleValuesParser, ValueRange};
use clap::{Arg, ArgAction};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving user configuration into argument state.
///
/// Everything here is detected before any task is emitted; once
/// configuration succeeds, task construction cannot fail.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for '{flag}': {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },
    #[error("Parameter '{name}' expects {expected} value(s), received {got}")]
    WrongCount {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("Unknown choice '{value}' for '{name}' (choices: {choices})")]
    UnknownChoice {
        name: String,
        value: String,
        choices: String,
    },
    #[error("Could not create directory '{path}'")]
    DirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Path '{path}' cannot be expressed relative to '{base}'")]
    NotRelative { path: String, base: String },
    #[error("Missing required argument '{name}'")]
    MissingAttr { name: String },
    #[error("Could not read settings file '{path}'")]
    SettingsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse settings file '{path}': {source}")]
    SettingsParse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error(transparent)]
    Path(#[from] PathError),
}

/// The capability shared by everything a command template can hold.
///
/// Query methods are pure given the argument's resolved state and an index
/// (slice index for per-slice commands, total slice count for single
/// commands). `apply_settings` is the only mutation point and runs exactly
/// once per run, before any query.
pub trait Argument {
    fn tokens(&self, _i: usize) -> Vec<String> {
        Vec::new()
    }

    fn inputs(&self, _i: usize) -> Vec<PathBuf> {
        Vec::new()
    }

    fn outputs(&self, _i: usize) -> Vec<PathBuf> {
        Vec::new()
    }

    fn settings_used(&self) -> Vec<String> {
        Vec::new()
    }

    fn register_flags(&self, _registry: &mut FlagRegistry) {}

    fn apply_settings(
        &mut self,
        _settings: &SettingsMap,
        _args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        Ok(())
    }
}

// --- Value conversion ---

/// Declares how a parameter's raw value is validated and converted. The
/// converted value is exactly what the invoked program will receive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    /// Kept as-is.
    Str,
    /// Integer with optional inclusive bounds.
    Int { min: Option<i64>, max: Option<i64> },
    /// Float with optional inclusive bounds.
    Float { min: Option<f64>, max: Option<f64> },
    /// Tilde/env-expanded path, no filesystem interaction.
    Path,
    /// Expanded path whose directory is created and canonicalized.
    Dir,
}

impl ValueKind {
    /// Placeholder shown in help output for the flag's value.
    pub fn metavar(&self) -> &'static str {
        match self {
            Self::Int { .. } => "N",
            Self::Float { .. } => "F",
            _ => "X",
        }
    }

    /// Converts one raw value (lists element-wise) into its validated form.
    pub fn convert(&self, flag: &str, value: &Value) -> Result<Value, ConfigError> {
        if let Value::List(items) = value {
            let converted = items
                .iter()
                .map(|v| self.convert(flag, v))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::List(converted));
        }
        match self {
            Self::Str => Ok(Value::Str(scalar_text(value))),
            Self::Int { min, max } => {
                let n = parse_int(flag, value)?;
                check_bounds(flag, n, *min, *max)?;
                Ok(Value::Int(n))
            }
            Self::Float { min, max } => {
                let f = parse_float(flag, value)?;
                check_bounds(flag, f, *min, *max)?;
                Ok(Value::Float(f))
            }
            Self::Path => {
                let expanded = paths::expand_user(&scalar_text(value))?;
                Ok(Value::Str(expanded.display().to_string()))
            }
            Self::Dir => {
                let expanded = paths::expand_user(&scalar_text(value))?;
                std::fs::create_dir_all(&expanded).map_err(|e| ConfigError::DirCreation {
                    path: expanded.display().to_string(),
                    source: e,
                })?;
                let canonical =
                    dunce::canonicalize(&expanded).map_err(|e| ConfigError::DirCreation {
                        path: expanded.display().to_string(),
                        source: e,
                    })?;
                Ok(Value::Str(canonical.display().to_string()))
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.render().join(" "),
    }
}

fn parse_int(flag: &str, value: &Value) -> Result<i64, ConfigError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Str(s) => s.trim().parse().map_err(|_| ConfigError::InvalidValue {
            flag: flag.to_string(),
            value: s.clone(),
            reason: "not an integer".to_string(),
        }),
        other => Err(ConfigError::InvalidValue {
            flag: flag.to_string(),
            value: scalar_text(other),
            reason: "not an integer".to_string(),
        }),
    }
}

fn parse_float(flag: &str, value: &Value) -> Result<f64, ConfigError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(n) => Ok(*n as f64),
        Value::Str(s) => s.trim().parse().map_err(|_| ConfigError::InvalidValue {
            flag: flag.to_string(),
            value: s.clone(),
            reason: "not a number".to_string(),
        }),
        other => Err(ConfigError::InvalidValue {
            flag: flag.to_string(),
            value: scalar_text(other),
            reason: "not a number".to_string(),
        }),
    }
}

fn check_bounds<T: PartialOrd + Copy + std::fmt::Display>(
    flag: &str,
    value: T,
    min: Option<T>,
    max: Option<T>,
) -> Result<(), ConfigError> {
    if let Some(lo) = min
        && value < lo
    {
        return Err(ConfigError::InvalidValue {
            flag: flag.to_string(),
            value: value.to_string(),
            reason: format!("must be at least {lo}"),
        });
    }
    if let Some(hi) = max
        && value > hi
    {
        return Err(ConfigError::InvalidValue {
            flag: flag.to_string(),
            value: value.to_string(),
            reason: format!("must be at most {hi}"),
        });
    }
    Ok(())
}

/// How many values a list parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Exact(usize),
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
    /// Inclusive range. Flag registration is relaxed to "one or more"; the
    /// authoritative count check runs during `apply_settings`.
    Range(usize, usize),
}

impl Cardinality {
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Self::Exact(k) => n == *k,
            Self::ZeroOrOne => n <= 1,
            Self::ZeroOrMore => true,
            Self::OneOrMore => n >= 1,
            Self::Range(lo, hi) => (*lo..=*hi).contains(&n),
        }
    }

    pub fn num_args(&self) -> ValueRange {
        match self {
            Self::Exact(k) => ValueRange::from(*k),
            Self::ZeroOrOne => ValueRange::from(0..=1),
            Self::ZeroOrMore => ValueRange::from(0..),
            Self::OneOrMore | Self::Range(..) => ValueRange::from(1..),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Exact(k) => k.to_string(),
            Self::ZeroOrOne => "at most 1".to_string(),
            Self::ZeroOrMore => "any number of".to_string(),
            Self::OneOrMore => "at least 1".to_string(),
            Self::Range(lo, hi) => format!("between {lo} and {hi}"),
        }
    }
}

/// Splits the `&` short-alias marker out of a parameter name: `"&level"`
/// declares the short flag `-l` and the long flag `--level`.
fn split_marker(name: &str) -> (String, Option<char>) {
    match name.find('&') {
        Some(idx) => {
            let short = name[idx + 1..].chars().next();
            let clean: String = name.chars().filter(|c| *c != '&').collect();
            (clean, short)
        }
        None => (name.to_string(), None),
    }
}

// --- Setting ---

/// A named, defaulted value bound to user configuration. Renders its
/// current value as command tokens and reports itself as the single
/// setting it depends on.
#[derive(Debug, Clone)]
pub struct Setting {
    name: String,
    default: Value,
    current: Value,
}

impl Setting {
    pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            current: default.clone(),
            default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current(&self) -> &Value {
        &self.current
    }
}

impl Argument for Setting {
    fn tokens(&self, _i: usize) -> Vec<String> {
        self.current.render()
    }

    fn settings_used(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        _args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        self.current = settings
            .get(&self.name)
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        Ok(())
    }
}

// --- Parameter ---

/// A Setting that also registers a user-facing flag and validates its
/// value through a `ValueKind` conversion.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    short: Option<char>,
    default: Value,
    current: Value,
    kind: ValueKind,
    help: String,
}

impl Parameter {
    pub fn new(
        name: &str,
        default: impl Into<Value>,
        kind: ValueKind,
        help: impl Into<String>,
    ) -> Self {
        let (name, short) = split_marker(name);
        let default = default.into();
        Self {
            name,
            short,
            current: default.clone(),
            default,
            kind,
            help: help.into(),
        }
    }

    pub fn current(&self) -> &Value {
        &self.current
    }
}

impl Argument for Parameter {
    fn tokens(&self, _i: usize) -> Vec<String> {
        self.current.render()
    }

    fn settings_used(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn register_flags(&self, registry: &mut FlagRegistry) {
        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.help.clone());
        if let Some(c) = self.short {
            arg = arg.short(c);
        } else {
            arg = arg.value_name(self.kind.metavar());
        }
        registry.add(arg);
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        _args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        let raw = settings
            .get(&self.name)
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        self.current = self.kind.convert(&self.name, &raw)?;
        Ok(())
    }
}

// --- BoolParameter ---

/// A presence flag: registers a set-true action and converts any
/// configured value to a boolean.
#[derive(Debug, Clone)]
pub struct BoolParameter {
    name: String,
    short: Option<char>,
    default: bool,
    current: bool,
    help: String,
}

impl BoolParameter {
    pub fn new(name: &str, default: bool, help: impl Into<String>) -> Self {
        let (name, short) = split_marker(name);
        Self {
            name,
            short,
            default,
            current: default,
            help: help.into(),
        }
    }

    pub fn current(&self) -> bool {
        self.current
    }

    fn to_bool(&self, value: &Value) -> Result<bool, ConfigError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(n) => Ok(*n != 0),
            Value::Str(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    flag: self.name.clone(),
                    value: s.clone(),
                    reason: "not a boolean".to_string(),
                }),
            },
            other => Err(ConfigError::InvalidValue {
                flag: self.name.clone(),
                value: scalar_text(other),
                reason: "not a boolean".to_string(),
            }),
        }
    }
}

impl Argument for BoolParameter {
    fn tokens(&self, _i: usize) -> Vec<String> {
        Value::Bool(self.current).render()
    }

    fn settings_used(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn register_flags(&self, registry: &mut FlagRegistry) {
        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .action(ArgAction::SetTrue)
            .help(self.help.clone());
        if let Some(c) = self.short {
            arg = arg.short(c);
        }
        registry.add(arg);
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        _args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        self.current = match settings.get(&self.name) {
            Some(v) => self.to_bool(v)?,
            None => self.default,
        };
        Ok(())
    }
}

// --- ListParameter ---

/// A Parameter accepting several values with a declared cardinality. The
/// count check always runs here, not in clap, so ranged cardinalities and
/// settings-file values are validated identically.
#[derive(Debug, Clone)]
pub struct ListParameter {
    name: String,
    short: Option<char>,
    default: Vec<Value>,
    current: Vec<Value>,
    kind: ValueKind,
    cardinality: Cardinality,
    help: String,
}

impl ListParameter {
    pub fn new(
        name: &str,
        default: Vec<Value>,
        kind: ValueKind,
        cardinality: Cardinality,
        help: impl Into<String>,
    ) -> Self {
        let (name, short) = split_marker(name);
        Self {
            name,
            short,
            current: default.clone(),
            default,
            kind,
            cardinality,
            help: help.into(),
        }
    }

    pub fn current(&self) -> &[Value] {
        &self.current
    }
}

impl Argument for ListParameter {
    fn tokens(&self, _i: usize) -> Vec<String> {
        self.current.iter().flat_map(Value::render).collect()
    }

    fn settings_used(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn register_flags(&self, registry: &mut FlagRegistry) {
        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .num_args(self.cardinality.num_args())
            .help(self.help.clone());
        if let Some(c) = self.short {
            arg = arg.short(c);
        } else {
            arg = arg.value_name(self.kind.metavar());
        }
        registry.add(arg);
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        _args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        let raw: Vec<Value> = match settings.get(&self.name) {
            Some(Value::List(items)) => items.clone(),
            Some(other) => vec![other.clone()],
            None => self.default.clone(),
        };
        if !self.cardinality.accepts(raw.len()) {
            return Err(ConfigError::WrongCount {
                name: self.name.clone(),
                expected: self.cardinality.describe(),
                got: raw.len(),
            });
        }
        self.current = raw
            .iter()
            .map(|v| self.kind.convert(&self.name, v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }
}

// --- EnumParameter ---

/// A Parameter restricted to a fixed set of choices. The converted value
/// is the 1-based index of the chosen element; index 0 is reserved to mean
/// "disabled" for downstream native consumers.
#[derive(Debug, Clone)]
pub struct EnumParameter {
    name: String,
    short: Option<char>,
    default: String,
    choices: Vec<String>,
    current: i64,
    help: String,
}

impl EnumParameter {
    pub fn new(
        name: &str,
        default: impl Into<String>,
        choices: &[&str],
        help: impl Into<String>,
    ) -> Self {
        let (name, short) = split_marker(name);
        Self {
            name,
            short,
            default: default.into(),
            choices: choices.iter().map(|c| (*c).to_string()).collect(),
            current: 0,
            help: help.into(),
        }
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    fn index_of(&self, value: &str) -> Result<i64, ConfigError> {
        self.choices
            .iter()
            .position(|c| c == value)
            .map(|idx| idx as i64 + 1)
            .ok_or_else(|| ConfigError::UnknownChoice {
                name: self.name.clone(),
                value: value.to_string(),
                choices: self.choices.join(", "),
            })
    }
}

impl Argument for EnumParameter {
    fn tokens(&self, _i: usize) -> Vec<String> {
        vec![self.current.to_string()]
    }

    fn settings_used(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn register_flags(&self, registry: &mut FlagRegistry) {
        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .value_parser(PossibleValuesParser::new(self.choices.clone()))
            .help(self.help.clone());
        if let Some(c) = self.short {
            arg = arg.short(c);
        }
        registry.add(arg);
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        _args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        let chosen = match settings.get(&self.name) {
            Some(v) => scalar_text(v),
            None => self.default.clone(),
        };
        self.current = self.index_of(&chosen)?;
        Ok(())
    }
}
