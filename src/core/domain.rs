// src/core/domain.rs

use crate::constants::{
    ATTR_TEMP, DEFAULT_MASK_EXT, DEFAULT_MASK_FLAG, DEFAULT_MASK_FOLDER, SETTING_THREE_D,
};
use crate::core::argument::{Argument, ConfigError};
use crate::core::files::{Direction, SlicePaths};
use crate::core::paths;
use crate::models::{ParsedArgs, SettingsMap};
use std::path::PathBuf;

/// The classifier model file, passed to external tools as a path relative
/// to the temporary working directory.
///
/// The path comes from a named attribute of the parsed arguments (`model`
/// by default) and is re-expressed relative to the `temp` attribute.
/// Training commands construct it as an output; prediction commands
/// consume it as an input.
#[derive(Debug, Clone)]
pub struct Model {
    attr: String,
    direction: Direction,
    resolved: Option<PathBuf>,
}

impl Model {
    pub fn input(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            direction: Direction::Input,
            resolved: None,
        }
    }

    pub fn output(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            direction: Direction::Output,
            resolved: None,
        }
    }
}

impl Argument for Model {
    fn tokens(&self, _i: usize) -> Vec<String> {
        self.resolved
            .as_ref()
            .map_or_else(Vec::new, |p| vec![p.display().to_string()])
    }

    fn inputs(&self, _i: usize) -> Vec<PathBuf> {
        match (&self.resolved, self.direction) {
            (Some(p), Direction::Input) => vec![p.clone()],
            _ => Vec::new(),
        }
    }

    fn outputs(&self, _i: usize) -> Vec<PathBuf> {
        match (&self.resolved, self.direction) {
            (Some(p), Direction::Output) => vec![p.clone()],
            _ => Vec::new(),
        }
    }

    fn apply_settings(
        &mut self,
        _settings: &SettingsMap,
        args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        let raw = args
            .get_str(&self.attr)
            .ok_or_else(|| ConfigError::MissingAttr {
                name: self.attr.clone(),
            })?;
        let temp = args.get_str(ATTR_TEMP).unwrap_or(".");
        let path = paths::absolutize(paths::expand_user(raw)?)?;
        let base = paths::absolutize(paths::expand_user(temp)?)?;
        let relative =
            paths::relative_to(&path, &base).ok_or_else(|| ConfigError::NotRelative {
                path: path.display().to_string(),
                base: base.display().to_string(),
            })?;
        self.resolved = Some(relative);
        Ok(())
    }
}

/// The optional per-slice mask input: a flag token followed by the mask
/// path for the slice, contributed only when the user configured a mask
/// source.
///
/// Presence is read from the pluralized folder attribute of the parsed
/// arguments (`msks` for the default `msk` folder). When absent, the
/// argument is inert: no tokens, no inputs.
#[derive(Debug, Clone)]
pub struct Masks {
    flag: String,
    series: SlicePaths,
    attr: String,
    present: bool,
}

impl Masks {
    pub fn new() -> Self {
        Self::with(DEFAULT_MASK_FLAG, DEFAULT_MASK_FOLDER, DEFAULT_MASK_EXT)
    }

    pub fn with(flag: impl Into<String>, folder: &str, ext: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            series: SlicePaths::new(folder, ext),
            attr: format!("{folder}s"),
            present: false,
        }
    }
}

impl Default for Masks {
    fn default() -> Self {
        Self::new()
    }
}

impl Argument for Masks {
    fn tokens(&self, i: usize) -> Vec<String> {
        if self.present {
            vec![self.flag.clone(), self.series.at(i).display().to_string()]
        } else {
            Vec::new()
        }
    }

    fn inputs(&self, i: usize) -> Vec<PathBuf> {
        if self.present {
            vec![self.series.at(i)]
        } else {
            Vec::new()
        }
    }

    fn settings_used(&self) -> Vec<String> {
        vec![SETTING_THREE_D.to_string()]
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        self.series.resolve_mode(settings);
        self.present = args.contains(&self.attr);
        Ok(())
    }
}
