// src/core/condition.rs

use crate::core::argument::{Argument, ConfigError};
use crate::core::flags::FlagRegistry;
use crate::models::{ParsedArgs, SettingsMap};
use std::path::PathBuf;

/// Predicate evaluated once, at configuration time, over the resolved
/// settings and the parsed command line.
pub type Predicate = Box<dyn Fn(&SettingsMap, &ParsedArgs) -> bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Unresolved,
    Primary,
    Secondary,
    Neither,
}

/// An Argument that stands in for one of two child Arguments, chosen by a
/// predicate during `apply_settings`.
///
/// Both branches are resolved before the predicate runs, and both register
/// their flags, so the configuration surface does not depend on which
/// branch wins. `settings_used` likewise reports the union of both
/// branches plus any extra settings declared at construction.
pub struct Condition {
    predicate: Predicate,
    primary: Box<dyn Argument>,
    secondary: Option<Box<dyn Argument>>,
    extra_settings: Vec<String>,
    resolved: Branch,
}

impl Condition {
    pub fn new(
        predicate: impl Fn(&SettingsMap, &ParsedArgs) -> bool + 'static,
        primary: impl Argument + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            primary: Box::new(primary),
            secondary: None,
            extra_settings: Vec::new(),
            resolved: Branch::Unresolved,
        }
    }

    /// Supplies the branch taken when the predicate is false. Without one,
    /// a false predicate resolves to nothing.
    pub fn otherwise(mut self, secondary: impl Argument + 'static) -> Self {
        self.secondary = Some(Box::new(secondary));
        self
    }

    /// Declares settings the predicate itself depends on, so they appear
    /// in the emitted task's settings set.
    pub fn with_extra_settings(mut self, names: &[&str]) -> Self {
        self.extra_settings
            .extend(names.iter().map(|n| (*n).to_string()));
        self
    }

    fn selected(&self) -> Option<&dyn Argument> {
        match self.resolved {
            Branch::Primary => Some(self.primary.as_ref()),
            Branch::Secondary => self.secondary.as_deref(),
            Branch::Neither | Branch::Unresolved => None,
        }
    }
}

impl Argument for Condition {
    fn tokens(&self, i: usize) -> Vec<String> {
        self.selected().map_or_else(Vec::new, |a| a.tokens(i))
    }

    fn inputs(&self, i: usize) -> Vec<PathBuf> {
        self.selected().map_or_else(Vec::new, |a| a.inputs(i))
    }

    fn outputs(&self, i: usize) -> Vec<PathBuf> {
        self.selected().map_or_else(Vec::new, |a| a.outputs(i))
    }

    fn settings_used(&self) -> Vec<String> {
        let mut names = self.extra_settings.clone();
        names.extend(self.primary.settings_used());
        if let Some(secondary) = &self.secondary {
            names.extend(secondary.settings_used());
        }
        names
    }

    fn register_flags(&self, registry: &mut FlagRegistry) {
        self.primary.register_flags(registry);
        if let Some(secondary) = &self.secondary {
            secondary.register_flags(registry);
        }
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        self.primary.apply_settings(settings, args)?;
        if let Some(secondary) = &mut self.secondary {
            secondary.apply_settings(settings, args)?;
        }
        self.resolved = if (self.predicate)(settings, args) {
            Branch::Primary
        } else if self.secondary.is_some() {
            Branch::Secondary
        } else {
            Branch::Neither
        };
        Ok(())
    }
}
