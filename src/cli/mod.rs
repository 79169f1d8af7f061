// src/cli/mod.rs

//! Driver entry point.
//!
//! A run is one pass through a fixed sequence: declare the pipeline,
//! assemble the full flag surface (base flags plus every parameter flag
//! the commands contribute), parse, layer the settings file under the
//! typed flags, configure every command, and hand the resolved tasks to
//! the selected sink.

pub mod args;

use crate::constants::ATTR_TEMP;
use crate::core::argument::{ConfigError, ValueKind};
use crate::core::command::Cmd;
use crate::core::config;
use crate::core::flags::{self, FlagRegistry};
use crate::core::paths;
use crate::models::{ParsedArgs, SettingsMap, Value};
use crate::pipeline;
use crate::system::manifest::ManifestWriter;
use crate::system::plan::PlanPrinter;
use anyhow::Context;
use clap::ArgMatches;
use std::path::Path;

/// Parses the command line and runs the driver to completion.
pub fn run() -> anyhow::Result<()> {
    let commands = pipeline::declare();
    let matches = build_command(&commands).get_matches();
    execute(commands, &matches)
}

/// The complete flag surface: driver base flags first, then whatever
/// each pipeline command's parameters contribute.
fn build_command(commands: &[Cmd]) -> clap::Command {
    let mut registry = FlagRegistry::new(args::base_command());
    for cmd in commands {
        cmd.register_flags(&mut registry);
    }
    registry.into_command()
}

fn execute(mut commands: Vec<Cmd>, matches: &ArgMatches) -> anyhow::Result<()> {
    let mut settings = match matches.get_one::<String>("settings") {
        Some(raw) => {
            let path = paths::expand_user(raw)?;
            config::load_settings_file(&path)?
        }
        None => SettingsMap::new(),
    };
    config::overlay_matches(&mut settings, matches);

    let mut parsed = flags::capture(matches);
    resolve_temp_dir(&mut parsed)?;

    if let Some(raw) = parsed.get_str("rusage")
        && let Some(path) = config::probe_rusage_log(raw)
    {
        log::info!(
            "Resource usage records will be appended to '{}'.",
            path.display()
        );
    }

    for cmd in &mut commands {
        cmd.apply_settings(&settings, &parsed)
            .with_context(|| format!("Configuration failed for command '{}'", cmd.name()))?;
    }
    let active = commands.iter().filter(|c| !c.is_skipped()).count();
    log::debug!(
        "Configured {} command(s), {} active for this run.",
        commands.len(),
        active
    );

    let count = slice_count(&parsed)?;
    let manifest_target = parsed.get_str("manifest").map(String::from);

    if let Some(target) = &manifest_target {
        let mut writer = ManifestWriter::new(count);
        for cmd in &commands {
            cmd.add_tasks(&mut writer, count);
        }
        writer.write_to(Path::new(target))?;
    }
    if parsed.get_flag("plan") || manifest_target.is_none() {
        let mut printer = PlanPrinter::new();
        for cmd in &commands {
            cmd.add_tasks(&mut printer, count);
        }
        printer.print();
    }
    Ok(())
}

/// Expands and creates the temporary working directory, then swaps the
/// canonical form back into the attribute map so path-valued arguments
/// resolve against it.
fn resolve_temp_dir(parsed: &mut ParsedArgs) -> Result<(), ConfigError> {
    let raw = parsed
        .get(ATTR_TEMP)
        .cloned()
        .unwrap_or_else(|| Value::from("."));
    let resolved = ValueKind::Dir.convert(ATTR_TEMP, &raw)?;
    parsed.insert(ATTR_TEMP, resolved);
    Ok(())
}

fn slice_count(parsed: &ParsedArgs) -> Result<usize, ConfigError> {
    let raw = parsed.get("slices").cloned().unwrap_or(Value::Int(1));
    let kind = ValueKind::Int {
        min: Some(1),
        max: None,
    };
    match kind.convert("slices", &raw)? {
        Value::Int(n) => usize::try_from(n).map_err(|_| ConfigError::InvalidValue {
            flag: "slices".into(),
            value: n.to_string(),
            reason: "value does not fit the platform word size".into(),
        }),
        other => Err(ConfigError::InvalidValue {
            flag: "slices".into(),
            value: other.render().join(" "),
            reason: "expected a single integer".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> (Vec<Cmd>, ArgMatches) {
        let commands = pipeline::declare();
        let matches = build_command(&commands)
            .try_get_matches_from(argv)
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        (commands, matches)
    }

    #[test]
    fn slice_count_defaults_to_one() {
        assert_eq!(slice_count(&ParsedArgs::new()).unwrap(), 1);
    }

    #[test]
    fn slice_count_rejects_zero() {
        let mut parsed = ParsedArgs::new();
        parsed.insert("slices", Value::from("0"));
        assert!(matches!(
            slice_count(&parsed),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn slice_count_parses_the_flag_text() {
        let mut parsed = ParsedArgs::new();
        parsed.insert("slices", Value::from("128"));
        assert_eq!(slice_count(&parsed).unwrap(), 128);
    }

    #[test]
    fn temp_dir_is_created_and_canonicalized() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("work");
        let mut parsed = ParsedArgs::new();
        parsed.insert(ATTR_TEMP, Value::from(target.to_str().unwrap()));
        resolve_temp_dir(&mut parsed).unwrap();
        assert!(target.is_dir());
        let resolved = parsed.get_str(ATTR_TEMP).unwrap();
        assert!(Path::new(resolved).is_absolute());
    }

    #[test]
    fn manifest_run_writes_the_task_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("tasks.json");
        let temp = dir.path().join("work");
        let (commands, matches) = parse(&[
            "sliceflow",
            "--temp",
            temp.to_str().unwrap(),
            "--manifest",
            manifest.to_str().unwrap(),
            "-n",
            "2",
        ]);
        execute(commands, &matches).unwrap();

        let content = std::fs::read_to_string(&manifest).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["slice_count"], 2);
        // 5 per-slice commands over 2 slices plus the single segment task.
        assert_eq!(parsed["tasks"].as_array().unwrap().len(), 5 * 2 + 1);
    }

    #[test]
    fn settings_file_feeds_the_emitted_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.toml");
        std::fs::write(&settings, "level = 0.25\n").unwrap();
        let manifest = dir.path().join("tasks.json");
        let temp = dir.path().join("work");
        let (commands, matches) = parse(&[
            "sliceflow",
            "--settings",
            settings.to_str().unwrap(),
            "--temp",
            temp.to_str().unwrap(),
            "--manifest",
            manifest.to_str().unwrap(),
        ]);
        execute(commands, &matches).unwrap();
        let content = std::fs::read_to_string(&manifest).unwrap();
        assert!(content.contains("0.25"));
    }

    #[test]
    fn typed_flag_overrides_the_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.toml");
        std::fs::write(&settings, "level = 0.25\n").unwrap();
        let manifest = dir.path().join("tasks.json");
        let temp = dir.path().join("work");
        let (commands, matches) = parse(&[
            "sliceflow",
            "--settings",
            settings.to_str().unwrap(),
            "--temp",
            temp.to_str().unwrap(),
            "--manifest",
            manifest.to_str().unwrap(),
            "-l",
            "0.75",
        ]);
        execute(commands, &matches).unwrap();
        let content = std::fs::read_to_string(&manifest).unwrap();
        assert!(content.contains("0.75"));
        assert!(!content.contains("0.25"));
    }

    #[test]
    fn out_of_range_flag_surfaces_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("work");
        let (commands, matches) = parse(&[
            "sliceflow",
            "--temp",
            temp.to_str().unwrap(),
            "--plan",
            "-l",
            "1.5",
        ]);
        let err = execute(commands, &matches).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
