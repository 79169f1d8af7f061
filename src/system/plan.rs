// src/system/plan.rs

use crate::core::command::TaskSink;
use crate::models::Task;
use colored::Colorize;

/// Dry-run sink: collects every emitted task and renders the full plan to
/// the terminal, shell-quoted, with dependency and setting summaries.
#[derive(Debug, Default)]
pub struct PlanPrinter {
    tasks: Vec<Task>,
}

impl PlanPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "{} {} task(s)\n",
            "Plan:".bold(),
            self.tasks.len().to_string().cyan()
        );
        for (i, task) in self.tasks.iter().enumerate() {
            let index = format!("[{}]", i + 1);
            out.push_str(&format!("  {} {}\n", index.cyan(), quote(&task.tokens)));
            if !task.inputs.is_empty() {
                out.push_str(&format!(
                    "      {} {}\n",
                    "inputs:".dimmed(),
                    join_paths(task.inputs.iter())
                ));
            }
            if !task.outputs.is_empty() {
                out.push_str(&format!(
                    "      {} {}\n",
                    "outputs:".dimmed(),
                    join_paths(task.outputs.iter())
                ));
            }
            if !task.settings.is_empty() {
                let names: Vec<&str> = task.settings.iter().map(String::as_str).collect();
                out.push_str(&format!(
                    "      {} {}\n",
                    "settings:".dimmed(),
                    names.join(", ")
                ));
            }
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

fn quote(tokens: &[String]) -> String {
    shlex::try_join(tokens.iter().map(String::as_str))
        .unwrap_or_else(|_| tokens.join(" "))
}

fn join_paths<'a>(paths: impl Iterator<Item = &'a std::path::PathBuf>) -> String {
    paths
        .map(|p| crate::core::paths::display(p))
        .collect::<Vec<_>>()
        .join(", ")
}

impl TaskSink for PlanPrinter {
    fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_task() -> Task {
        let mut task = Task {
            tokens: vec!["watershed".into(), "-p".into(), "pb/0000.mha".into()],
            ..Task::default()
        };
        task.inputs.insert(PathBuf::from("pb/0000.mha"));
        task.outputs.insert(PathBuf::from("ws/0000.mha"));
        task.settings.insert("level".into());
        task.settings.insert("threeD".into());
        task
    }

    #[test]
    fn render_lists_every_task_with_dependencies() {
        colored::control::set_override(false);
        let mut printer = PlanPrinter::new();
        printer.add(sample_task());
        let rendered = printer.render();
        assert!(rendered.contains("Plan: 1 task(s)"));
        assert!(rendered.contains("[1] watershed -p pb/0000.mha"));
        assert!(rendered.contains("inputs: pb/0000.mha"));
        assert!(rendered.contains("outputs: ws/0000.mha"));
        assert!(rendered.contains("settings: level, threeD"));
    }

    #[test]
    fn tokens_needing_quotes_are_quoted() {
        colored::control::set_override(false);
        let mut printer = PlanPrinter::new();
        let task = Task {
            tokens: vec!["echo".into(), "two words".into()],
            ..Task::default()
        };
        printer.add(task);
        assert!(printer.render().contains("echo 'two words'"));
    }

    #[test]
    fn empty_plan_renders_a_zero_count() {
        colored::control::set_override(false);
        let printer = PlanPrinter::new();
        assert!(printer.render().contains("Plan: 0 task(s)"));
    }
}
