// src/core/files.rs

use crate::constants::{SETTING_THREE_D, SLICE_PAD_WIDTH, STACK_PATTERN};
use crate::core::argument::{Argument, ConfigError};
use crate::models::{ParsedArgs, SettingsMap, Value};
use std::path::{Path, PathBuf};

/// Whether a file-producing argument reports its paths as task inputs or
/// task outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// The shared path layout for multi-file arguments.
///
/// In 3D mode the stack is one file, `<folder>.<ext>`. In 2D mode it is
/// one file per slice, `<folder>/NNNN.<ext>` with a zero-padded 4-digit
/// index. The mode comes from the `threeD` setting, resolved once during
/// configuration.
#[derive(Debug, Clone)]
pub(crate) struct SlicePaths {
    folder: String,
    ext: String,
    three_d: bool,
}

impl SlicePaths {
    pub(crate) fn new(folder: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            ext: ext.into(),
            three_d: false,
        }
    }

    pub(crate) fn three_d(&self) -> bool {
        self.three_d
    }

    pub(crate) fn whole(&self) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.folder, self.ext))
    }

    pub(crate) fn slice(&self, i: usize) -> PathBuf {
        Path::new(&self.folder).join(format!("{i:0width$}.{}", self.ext, width = SLICE_PAD_WIDTH))
    }

    /// The per-slice path for index `i`, or the whole file in 3D.
    pub(crate) fn at(&self, i: usize) -> PathBuf {
        if self.three_d { self.whole() } else { self.slice(i) }
    }

    /// Every path the stack occupies for `slice_count` slices.
    pub(crate) fn enumerate(&self, slice_count: usize) -> Vec<PathBuf> {
        if self.three_d {
            vec![self.whole()]
        } else {
            (0..slice_count).map(|i| self.slice(i)).collect()
        }
    }

    /// The `<folder>/####.<ext>` placeholder path external stack readers
    /// and writers substitute per slice.
    pub(crate) fn pattern(&self) -> PathBuf {
        Path::new(&self.folder).join(format!("{STACK_PATTERN}.{}", self.ext))
    }

    pub(crate) fn resolve_mode(&mut self, settings: &SettingsMap) {
        self.three_d = settings.get(SETTING_THREE_D).is_some_and(Value::truthy);
    }
}

fn token(path: &Path) -> String {
    path.display().to_string()
}

// --- Single fixed files ---

/// One fixed path rendered as a single token, with no dependency role.
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
    direction: Option<Direction>,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            direction: None,
        }
    }

    /// The same path, reported as a task input.
    pub fn input(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            direction: Some(Direction::Input),
        }
    }

    /// The same path, reported as a task output.
    pub fn output(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            direction: Some(Direction::Output),
        }
    }
}

impl Argument for File {
    fn tokens(&self, _i: usize) -> Vec<String> {
        vec![token(&self.path)]
    }

    fn inputs(&self, _i: usize) -> Vec<PathBuf> {
        match self.direction {
            Some(Direction::Input) => vec![self.path.clone()],
            _ => Vec::new(),
        }
    }

    fn outputs(&self, _i: usize) -> Vec<PathBuf> {
        match self.direction {
            Some(Direction::Output) => vec![self.path.clone()],
            _ => Vec::new(),
        }
    }
}

// --- Whole-stack sets ---

/// A whole stack of files passed to a single command: every enumerated
/// path becomes a token, and the input/output variants report the full
/// list as dependencies. The index argument is the total slice count.
#[derive(Debug, Clone)]
pub struct FileSet {
    paths: SlicePaths,
    direction: Option<Direction>,
}

impl FileSet {
    pub fn new(folder: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            paths: SlicePaths::new(folder, ext),
            direction: None,
        }
    }

    pub fn input(folder: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            paths: SlicePaths::new(folder, ext),
            direction: Some(Direction::Input),
        }
    }

    pub fn output(folder: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            paths: SlicePaths::new(folder, ext),
            direction: Some(Direction::Output),
        }
    }
}

impl Argument for FileSet {
    fn tokens(&self, slice_count: usize) -> Vec<String> {
        self.paths
            .enumerate(slice_count)
            .iter()
            .map(|p| token(p))
            .collect()
    }

    fn inputs(&self, slice_count: usize) -> Vec<PathBuf> {
        match self.direction {
            Some(Direction::Input) => self.paths.enumerate(slice_count),
            _ => Vec::new(),
        }
    }

    fn outputs(&self, slice_count: usize) -> Vec<PathBuf> {
        match self.direction {
            Some(Direction::Output) => self.paths.enumerate(slice_count),
            _ => Vec::new(),
        }
    }

    fn settings_used(&self) -> Vec<String> {
        vec![SETTING_THREE_D.to_string()]
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        _args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        self.paths.resolve_mode(settings);
        Ok(())
    }
}

// --- Per-slice series ---

/// One file of a stack, selected by slice index: the token and dependency
/// for slice `i` (or the whole file in 3D, where every index maps to the
/// same single path).
#[derive(Debug, Clone)]
pub struct FileSeries {
    paths: SlicePaths,
    direction: Option<Direction>,
}

impl FileSeries {
    pub fn new(folder: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            paths: SlicePaths::new(folder, ext),
            direction: None,
        }
    }

    pub fn input(folder: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            paths: SlicePaths::new(folder, ext),
            direction: Some(Direction::Input),
        }
    }

    pub fn output(folder: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            paths: SlicePaths::new(folder, ext),
            direction: Some(Direction::Output),
        }
    }
}

impl Argument for FileSeries {
    fn tokens(&self, i: usize) -> Vec<String> {
        vec![token(&self.paths.at(i))]
    }

    fn inputs(&self, i: usize) -> Vec<PathBuf> {
        match self.direction {
            Some(Direction::Input) => vec![self.paths.at(i)],
            _ => Vec::new(),
        }
    }

    fn outputs(&self, i: usize) -> Vec<PathBuf> {
        match self.direction {
            Some(Direction::Output) => vec![self.paths.at(i)],
            _ => Vec::new(),
        }
    }

    fn settings_used(&self) -> Vec<String> {
        vec![SETTING_THREE_D.to_string()]
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        _args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        self.paths.resolve_mode(settings);
        Ok(())
    }
}

// --- Image stacks ---

/// A whole stack rendered as a descriptor instead of an explicit file
/// list: `<folder>/####.<ext> start step [end]`. Stack-aware external
/// tools substitute the slice index into the `####` placeholder. The end
/// index is present for inputs (the last readable slice) and omitted for
/// outputs, which write open-ended. Dependencies are still the real
/// enumerated files. In 3D both collapse to the single whole-file path.
#[derive(Debug, Clone)]
pub struct ImageStack {
    paths: SlicePaths,
    direction: Direction,
}

impl ImageStack {
    pub fn input(folder: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            paths: SlicePaths::new(folder, ext),
            direction: Direction::Input,
        }
    }

    pub fn output(folder: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            paths: SlicePaths::new(folder, ext),
            direction: Direction::Output,
        }
    }
}

impl Argument for ImageStack {
    fn tokens(&self, slice_count: usize) -> Vec<String> {
        if self.paths.three_d() {
            return vec![token(&self.paths.whole())];
        }
        let mut tokens = vec![
            token(&self.paths.pattern()),
            "0".to_string(),
            "1".to_string(),
        ];
        if self.direction == Direction::Input {
            tokens.push(slice_count.saturating_sub(1).to_string());
        }
        tokens
    }

    fn inputs(&self, slice_count: usize) -> Vec<PathBuf> {
        match self.direction {
            Direction::Input => self.paths.enumerate(slice_count),
            Direction::Output => Vec::new(),
        }
    }

    fn outputs(&self, slice_count: usize) -> Vec<PathBuf> {
        match self.direction {
            Direction::Output => self.paths.enumerate(slice_count),
            Direction::Input => Vec::new(),
        }
    }

    fn settings_used(&self) -> Vec<String> {
        vec![SETTING_THREE_D.to_string()]
    }

    fn apply_settings(
        &mut self,
        settings: &SettingsMap,
        _args: &ParsedArgs,
    ) -> Result<(), ConfigError> {
        self.paths.resolve_mode(settings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_d_settings() -> SettingsMap {
        let mut settings = SettingsMap::new();
        settings.insert(SETTING_THREE_D, Value::Bool(true));
        settings
    }

    fn resolved<A: Argument>(mut arg: A, settings: &SettingsMap) -> A {
        arg.apply_settings(settings, &ParsedArgs::new()).unwrap();
        arg
    }

    #[test]
    fn series_pads_slice_index_to_four_digits() {
        let series = resolved(FileSeries::input("in", "png"), &SettingsMap::new());
        assert_eq!(series.tokens(0), vec!["in/0000.png"]);
        assert_eq!(series.tokens(12), vec!["in/0012.png"]);
        assert_eq!(series.inputs(12), vec![PathBuf::from("in/0012.png")]);
        assert!(series.outputs(12).is_empty());
    }

    #[test]
    fn series_collapses_in_three_d() {
        let series = resolved(FileSeries::output("out", "png"), &three_d_settings());
        assert_eq!(series.tokens(0), vec!["out.png"]);
        assert_eq!(series.tokens(7), vec!["out.png"]);
        assert_eq!(series.outputs(3), vec![PathBuf::from("out.png")]);
    }

    #[test]
    fn set_enumerates_strictly_increasing_slices() {
        let set = resolved(FileSet::input("pm", "h5"), &SettingsMap::new());
        let tokens = set.tokens(3);
        assert_eq!(tokens, vec!["pm/0000.h5", "pm/0001.h5", "pm/0002.h5"]);
        assert_eq!(set.inputs(3).len(), 3);
    }

    #[test]
    fn set_is_a_single_file_in_three_d() {
        let set = resolved(FileSet::output("pm", "h5"), &three_d_settings());
        assert_eq!(set.tokens(5), vec!["pm.h5"]);
        assert_eq!(set.outputs(5), vec![PathBuf::from("pm.h5")]);
    }

    #[test]
    fn plain_file_has_no_dependency_role() {
        let f = File::new("merge-order-pb");
        assert_eq!(f.tokens(0), vec!["merge-order-pb"]);
        assert!(f.inputs(0).is_empty());
        assert!(f.outputs(0).is_empty());
    }

    #[test]
    fn input_file_reports_its_path_once() {
        let f = File::input("data/truth.png");
        assert_eq!(f.inputs(4), vec![PathBuf::from("data/truth.png")]);
        assert!(f.outputs(4).is_empty());
    }

    #[test]
    fn input_stack_descriptor_names_the_last_slice() {
        let stack = resolved(ImageStack::input("img", "png"), &SettingsMap::new());
        assert_eq!(stack.tokens(5), vec!["img/####.png", "0", "1", "4"]);
        assert_eq!(stack.inputs(5).len(), 5);
        assert_eq!(stack.inputs(5)[0], PathBuf::from("img/0000.png"));
    }

    #[test]
    fn output_stack_descriptor_is_open_ended() {
        let stack = resolved(ImageStack::output("lbl", "png"), &SettingsMap::new());
        assert_eq!(stack.tokens(5), vec!["lbl/####.png", "0", "1"]);
        assert_eq!(stack.outputs(5).len(), 5);
    }

    #[test]
    fn stacks_collapse_in_three_d() {
        let input = resolved(ImageStack::input("img", "png"), &three_d_settings());
        assert_eq!(input.tokens(5), vec!["img.png"]);
        assert_eq!(input.inputs(5), vec![PathBuf::from("img.png")]);

        let output = resolved(ImageStack::output("lbl", "png"), &three_d_settings());
        assert_eq!(output.tokens(5), vec!["lbl.png"]);
    }

    #[test]
    fn only_reported_setting_is_the_mode_switch() {
        assert_eq!(FileSeries::new("in", "png").settings_used(), vec!["threeD"]);
        assert_eq!(FileSet::new("in", "png").settings_used(), vec!["threeD"]);
        assert_eq!(
            ImageStack::input("in", "png").settings_used(),
            vec!["threeD"]
        );
        assert!(File::new("x").settings_used().is_empty());
    }
}
