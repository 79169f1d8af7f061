// src/core/flags.rs

use crate::models::{ParsedArgs, Value};
use clap::parser::ValueSource;
use clap::{Arg, ArgMatches, Command};

/// Mutable wrapper around a `clap::Command` under construction.
///
/// The flag surface is assembled dynamically: the driver declares its base
/// flags, then every pipeline command contributes the flags of its
/// parameters through `Argument::register_flags`. The builder API is the
/// only clap surface that supports this.
pub struct FlagRegistry {
    cmd: Command,
}

impl FlagRegistry {
    pub fn new(cmd: Command) -> Self {
        Self { cmd }
    }

    /// Adds one flag definition. A parameter shared by several pipeline
    /// commands registers once; later identical ids are ignored.
    /// `clap::Command` consumes itself on every builder call, so the field
    /// is swapped out and back.
    pub fn add(&mut self, arg: Arg) {
        if self.cmd.get_arguments().any(|a| a.get_id() == arg.get_id()) {
            return;
        }
        let cmd = std::mem::replace(&mut self.cmd, Command::new(""));
        self.cmd = cmd.arg(arg);
    }

    pub fn into_command(self) -> Command {
        self.cmd
    }
}

/// Builds the post-parse attribute map from clap's matches.
///
/// Every present flag lands in the map under its canonical id: booleans as
/// `Bool`, single-valued flags as `Str`, multi-valued flags as a `List` of
/// strings. Typed conversion happens later, per parameter.
pub fn capture(matches: &ArgMatches) -> ParsedArgs {
    let mut args = ParsedArgs::new();
    for id in matches.ids() {
        let name = id.as_str();
        if let Ok(Some(flag)) = matches.try_get_one::<bool>(name) {
            args.insert(name, Value::Bool(*flag));
            continue;
        }
        if let Ok(Some(values)) = matches.try_get_many::<String>(name) {
            let mut vals: Vec<Value> = values.cloned().map(Value::Str).collect();
            if vals.len() == 1 {
                args.insert(name, vals.remove(0));
            } else {
                args.insert(name, Value::List(vals));
            }
        }
    }
    args
}

/// True when the user typed the flag on the command line, as opposed to the
/// value coming from a clap default. Drives settings-file overlay
/// precedence.
pub fn was_supplied(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}
