// src/core/command.rs

use crate::core::argument::{Argument, ConfigError};
use crate::core::flags::FlagRegistry;
use crate::models::{ParsedArgs, SettingsMap, Task};
use std::collections::BTreeSet;

/// One element of a command template: either a fixed string or an
/// Argument resolved per emission index.
pub enum Token {
    Literal(String),
    Arg(Box<dyn Argument>),
}

/// Literal token shorthand for pipeline declarations.
pub fn lit(text: impl Into<String>) -> Token {
    Token::Literal(text.into())
}

/// Argument token shorthand for pipeline declarations.
pub fn arg(argument: impl Argument + 'static) -> Token {
    Token::Arg(Box::new(argument))
}

/// How a command maps onto emitted tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// One task for the whole run; arguments see the total slice count.
    Single,
    /// One task per slice index in `[0, slice_count)`.
    PerSlice,
}

pub type SkipPredicate = Box<dyn Fn(&SettingsMap, &ParsedArgs) -> bool>;

/// Receives fully-resolved tasks. The external executor side of the
/// boundary; also implemented by the in-memory list used in tests.
pub trait TaskSink {
    fn add(&mut self, task: Task);
}

/// In-memory collecting sink.
#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskSink for TaskList {
    fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }
}

/// An ordered command template plus an execution mode and an optional
/// skip predicate.
///
/// Lifecycle: constructed once from the pipeline declaration, configured
/// once (`register_flags`, then `apply_settings` after parsing), then
/// `add_tasks` emits every task for the run and the command is done.
pub struct Cmd {
    name: String,
    tokens: Vec<Token>,
    mode: ExecMode,
    skip: Option<SkipPredicate>,
    skipped: bool,
}

impl Cmd {
    pub fn single(name: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self::with_mode(name, tokens, ExecMode::Single)
    }

    pub fn per_slice(name: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self::with_mode(name, tokens, ExecMode::PerSlice)
    }

    fn with_mode(name: impl Into<String>, tokens: Vec<Token>, mode: ExecMode) -> Self {
        Self {
            name: name.into(),
            tokens,
            mode,
            skip: None,
            skipped: false,
        }
    }

    /// Installs a predicate evaluated once at configuration time; when it
    /// returns true the command emits no tasks at all.
    pub fn skip_when(
        mut self,
        predicate: impl Fn(&SettingsMap, &ParsedArgs) -> bool + 'static,
    ) -> Self {
        self.skip = Some(Box::new(predicate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    pub fn register_flags(&self, registry: &mut FlagRegistry) {
        for token in &self.tokens {
            if let Token::Arg(argument) = token {
                argument.register_flags(registry);
            }
        }
    }

    pub fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        for token in &mut self.tokens {
            if let Token::Arg(argument) = token {
                argument.apply_settings(settings, args)?;
            }
        }
        self.skipped = self
            .skip
            .as_ref()
            .is_some_and(|predicate| predicate(settings, args));
        Ok(())
    }

    /// The deduplicated names of every setting any token depends on.
    /// Index-independent, so per-slice emission computes it once.
    fn settings_set(&self) -> BTreeSet<String> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Arg(argument) => Some(argument.settings_used()),
                Token::Literal(_) => None,
            })
            .flatten()
            .collect()
    }

    fn task_at(&self, i: usize, settings: &BTreeSet<String>) -> Task {
        let mut task = Task {
            settings: settings.clone(),
            ..Task::default()
        };
        for token in &self.tokens {
            match token {
                Token::Literal(text) => task.tokens.push(text.clone()),
                Token::Arg(argument) => {
                    task.tokens.extend(argument.tokens(i));
                    task.inputs.extend(argument.inputs(i));
                    task.outputs.extend(argument.outputs(i));
                }
            }
        }
        task
    }

    /// Emits this command's tasks: nothing if skipped, one task at index
    /// `slice_count` in single mode, one task per index otherwise.
    pub fn add_tasks(&self, sink: &mut dyn TaskSink, slice_count: usize) {
        if self.skipped {
            log::debug!("Command '{}' skipped, no tasks emitted.", self.name);
            return;
        }
        let settings = self.settings_set();
        match self.mode {
            ExecMode::Single => sink.add(self.task_at(slice_count, &settings)),
            ExecMode::PerSlice => {
                for i in 0..slice_count {
                    sink.add(self.task_at(i, &settings));
                }
            }
        }
    }
}
