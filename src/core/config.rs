// src/core/config.rs

use crate::core::argument::ConfigError;
use crate::core::flags;
use crate::core::paths;
use crate::models::{SettingsMap, Value};
use clap::ArgMatches;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Loads base setting values from a flat TOML file.
///
/// Only scalar and array entries are meaningful settings; nested tables
/// are skipped with a warning so a stray section header does not abort
/// the run.
pub fn load_settings_file(path: &Path) -> Result<SettingsMap, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsRead {
        path: path.display().to_string(),
        source: e,
    })?;
    let table: toml::Table =
        toml::from_str(&content).map_err(|e| ConfigError::SettingsParse {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

    let mut settings = SettingsMap::new();
    for (name, value) in table {
        match from_toml(&value) {
            Some(converted) => settings.insert(name, converted),
            None => {
                log::warn!(
                    "Ignoring non-scalar entry '{}' in settings file '{}'.",
                    name,
                    path.display()
                );
            }
        }
    }
    log::debug!(
        "Loaded {} setting(s) from '{}'.",
        settings.len(),
        path.display()
    );
    Ok(settings)
}

fn from_toml(value: &toml::Value) -> Option<Value> {
    match value {
        toml::Value::String(s) => Some(Value::Str(s.clone())),
        toml::Value::Integer(n) => Some(Value::Int(*n)),
        toml::Value::Float(f) => Some(Value::Float(*f)),
        toml::Value::Boolean(b) => Some(Value::Bool(*b)),
        toml::Value::Datetime(dt) => Some(Value::Str(dt.to_string())),
        toml::Value::Array(items) => {
            let converted: Option<Vec<Value>> = items.iter().map(from_toml).collect();
            converted.map(Value::List)
        }
        toml::Value::Table(_) => None,
    }
}

/// Overlays every flag the user actually typed onto the settings map.
/// Clap defaults do not participate, so the precedence is: built-in
/// default < settings file < command line.
pub fn overlay_matches(settings: &mut SettingsMap, matches: &ArgMatches) {
    let captured = flags::capture(matches);
    for id in matches.ids() {
        let name = id.as_str();
        if flags::was_supplied(matches, name)
            && let Some(value) = captured.get(name)
        {
            settings.insert(name, value.clone());
        }
    }
}

/// Probes the resource-usage log target for writability.
///
/// A failed probe is not fatal: the warning is logged and the feature is
/// disabled for the run.
pub fn probe_rusage_log(raw: &str) -> Option<PathBuf> {
    let path = match paths::expand_user(raw) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("Resource usage logging disabled: {e}");
            return None;
        }
    };
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(_) => Some(path),
        Err(e) => {
            log::warn!(
                "Resource usage log '{}' is not writable ({}); logging disabled.",
                path.display(),
                e
            );
            None
        }
    }
}
