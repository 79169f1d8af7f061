// src/pipeline.rs

//! The hierarchical-merge-tree segmentation pipeline, declared as data.
//!
//! Each command names the external tool it invokes and the working files
//! it reads and writes inside the temporary directory: `pb` (membrane
//! probability maps) -> `ws` (watershed labels) -> `pm` (pre-merged
//! labels) -> `mo` (merge order) -> `bf` (boundary features) -> `mp`
//! (merge probabilities) -> `seg` (final segmentation). Training and
//! prediction are mutually exclusive, switched by the presence of a
//! ground-truth folder.

use crate::core::argument::{
    BoolParameter, Cardinality, EnumParameter, ListParameter, Parameter, ValueKind,
};
use crate::core::command::{Cmd, arg, lit};
use crate::core::condition::Condition;
use crate::core::domain::{Masks, Model};
use crate::core::files::{File, FileSeries, ImageStack};
use crate::models::{ParsedArgs, Value};

const ATTR_TRUTH: &str = "truth";

fn training(args: &ParsedArgs) -> bool {
    args.contains(ATTR_TRUTH)
}

/// Builds the full command list. Constructed once per run; the driver
/// registers flags, applies settings, and emits tasks from it.
pub fn declare() -> Vec<Cmd> {
    vec![
        Cmd::per_slice(
            "watershed",
            vec![
                lit("watershed"),
                lit("-p"),
                arg(FileSeries::input("pb", "mha")),
                lit("-l"),
                arg(Parameter::new(
                    "&level",
                    0.9f64,
                    ValueKind::Float {
                        min: Some(0.0),
                        max: Some(1.0),
                    },
                    "Water level at which the watershed basins are cut",
                )),
                lit("-r"),
                arg(BoolParameter::new(
                    "relabel",
                    true,
                    "Relabel watershed basins consecutively",
                )),
                lit("-o"),
                arg(FileSeries::output("ws", "mha")),
            ],
        ),
        Cmd::per_slice(
            "pre-merge",
            vec![
                lit("pre-merge"),
                lit("-s"),
                arg(FileSeries::input("ws", "mha")),
                lit("-p"),
                arg(FileSeries::input("pb", "mha")),
                arg(Masks::new()),
                lit("-t"),
                arg(ListParameter::new(
                    "sizeThresholds",
                    vec![Value::Int(50), Value::Int(200), Value::Int(800)],
                    ValueKind::Int {
                        min: Some(1),
                        max: None,
                    },
                    Cardinality::Range(1, 3),
                    "Region size thresholds for the pre-merge rounds",
                )),
                lit("-b"),
                arg(Parameter::new(
                    "rpbThreshold",
                    0.5f64,
                    ValueKind::Float {
                        min: Some(0.0),
                        max: Some(1.0),
                    },
                    "Boundary probability threshold for pre-merging",
                )),
                lit("-o"),
                arg(FileSeries::output("pm", "mha")),
            ],
        ),
        Cmd::per_slice(
            "merge-order",
            vec![
                arg(Condition::new(
                    |_, args| args.get_flag("bc-order"),
                    File::new("merge-order-bc"),
                )
                .otherwise(File::new("merge-order-pb"))
                .with_extra_settings(&["bc-order"])),
                lit("-s"),
                arg(FileSeries::input("pm", "mha")),
                lit("-p"),
                arg(FileSeries::input("pb", "mha")),
                lit("-y"),
                arg(EnumParameter::new(
                    "saliency",
                    "median",
                    &["min", "max", "mean", "median"],
                    "Boundary saliency statistic used to order merges",
                )),
                lit("-o"),
                arg(FileSeries::output("mo", "dat")),
            ],
        ),
        Cmd::per_slice(
            "boundary-features",
            vec![
                lit("boundary-features"),
                lit("-s"),
                arg(FileSeries::input("pm", "mha")),
                lit("-p"),
                arg(FileSeries::input("pb", "mha")),
                lit("-r"),
                arg(FileSeries::input("mo", "dat")),
                arg(Masks::new()),
                lit("-o"),
                arg(FileSeries::output("bf", "h5")),
            ],
        ),
        Cmd::single(
            "train-classifier",
            vec![
                lit("train-rf"),
                arg(ImageStack::input("bf", "h5")),
                arg(ImageStack::input("truth", "png")),
                lit("-o"),
                arg(Model::output("model")),
            ],
        )
        .skip_when(|_, args| !training(args)),
        Cmd::per_slice(
            "predict",
            vec![
                lit("predict-rf"),
                arg(Model::input("model")),
                lit("-f"),
                arg(FileSeries::input("bf", "h5")),
                lit("-o"),
                arg(FileSeries::output("mp", "mha")),
            ],
        )
        .skip_when(|_, args| training(args)),
        Cmd::single(
            "segment",
            vec![
                lit("segment"),
                lit("-s"),
                arg(ImageStack::input("pm", "mha")),
                lit("-p"),
                arg(ImageStack::input("mp", "mha")),
                lit("-t"),
                arg(Parameter::new(
                    "segThreshold",
                    0.3f64,
                    ValueKind::Float {
                        min: Some(0.0),
                        max: Some(1.0),
                    },
                    "Merge probability threshold for the final segmentation",
                )),
                lit("-o"),
                arg(ImageStack::output("seg", "png")),
            ],
        )
        .skip_when(|_, args| training(args)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ATTR_TEMP;
    use crate::core::command::TaskList;
    use crate::core::flags::FlagRegistry;
    use crate::models::SettingsMap;
    use clap::Command;

    fn base_args() -> ParsedArgs {
        let mut args = ParsedArgs::new();
        args.insert("model", Value::from("model.ssv"));
        args.insert(ATTR_TEMP, Value::from("."));
        args
    }

    fn configure(args: &ParsedArgs, settings: &SettingsMap) -> Vec<Cmd> {
        let mut commands = declare();
        for cmd in &mut commands {
            cmd.apply_settings(settings, args).unwrap();
        }
        commands
    }

    fn emit_all(commands: &[Cmd], slice_count: usize) -> TaskList {
        let mut sink = TaskList::new();
        for cmd in commands {
            cmd.add_tasks(&mut sink, slice_count);
        }
        sink
    }

    #[test]
    fn flags_register_without_conflicts() {
        let mut registry = FlagRegistry::new(Command::new("sliceflow").no_binary_name(true));
        for cmd in declare() {
            cmd.register_flags(&mut registry);
        }
        let matches = registry
            .into_command()
            .try_get_matches_from([
                "-l",
                "0.8",
                "--saliency",
                "max",
                "--relabel",
                "--sizeThresholds",
                "10",
                "20",
            ])
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(matches.contains_id("level"));
    }

    #[test]
    fn prediction_run_emits_per_slice_and_whole_stack_tasks() {
        let commands = configure(&base_args(), &SettingsMap::new());
        let sink = emit_all(&commands, 3);
        // 5 per-slice commands over 3 slices, plus the single segment task;
        // train-classifier is skipped without a truth folder.
        assert_eq!(sink.len(), 5 * 3 + 1);
    }

    #[test]
    fn training_run_swaps_predict_for_train() {
        let mut args = base_args();
        args.insert("truth", Value::from("labels"));
        let commands = configure(&args, &SettingsMap::new());
        let sink = emit_all(&commands, 2);
        // watershed, pre-merge, merge-order, boundary-features per slice,
        // minus predict and segment, plus the single training task.
        assert_eq!(sink.len(), 4 * 2 + 1);
        let train = sink
            .tasks()
            .iter()
            .find(|t| t.tokens.first().is_some_and(|t| t == "train-rf"))
            .unwrap();
        assert!(train.tokens.contains(&"bf/####.h5".to_string()));
        assert!(train.tokens.contains(&"1".to_string()));
        assert!(train.outputs.iter().any(|p| p.ends_with("model.ssv")));
    }

    #[test]
    fn watershed_task_shape() {
        let commands = configure(&base_args(), &SettingsMap::new());
        let sink = emit_all(&commands, 1);
        let ws = &sink.tasks()[0];
        assert_eq!(
            ws.tokens,
            vec![
                "watershed",
                "-p",
                "pb/0000.mha",
                "-l",
                "0.9",
                "-r",
                "true",
                "-o",
                "ws/0000.mha"
            ]
        );
        assert!(ws.settings.contains("level"));
        assert!(ws.settings.contains("relabel"));
        assert!(ws.settings.contains("threeD"));
    }

    #[test]
    fn merge_order_condition_switches_program() {
        let default = configure(&base_args(), &SettingsMap::new());
        let sink = emit_all(&default, 1);
        let mo = sink
            .tasks()
            .iter()
            .find(|t| t.tokens.first().is_some_and(|t| t.starts_with("merge-order")))
            .unwrap();
        assert_eq!(mo.tokens[0], "merge-order-pb");

        let mut args = base_args();
        args.insert("bc-order", Value::Bool(true));
        let switched = configure(&args, &SettingsMap::new());
        let sink = emit_all(&switched, 1);
        let mo = sink
            .tasks()
            .iter()
            .find(|t| t.tokens.first().is_some_and(|t| t.starts_with("merge-order")))
            .unwrap();
        assert_eq!(mo.tokens[0], "merge-order-bc");
        assert!(mo.settings.contains("bc-order"));
    }

    #[test]
    fn three_d_collapses_every_stack() {
        let mut settings = SettingsMap::new();
        settings.insert("threeD", Value::Bool(true));
        let commands = configure(&base_args(), &settings);
        let sink = emit_all(&commands, 5);
        let ws = &sink.tasks()[0];
        assert!(ws.tokens.contains(&"pb.mha".to_string()));
        assert!(ws.tokens.contains(&"ws.mha".to_string()));
    }

    #[test]
    fn masks_appear_only_when_configured() {
        let commands = configure(&base_args(), &SettingsMap::new());
        let sink = emit_all(&commands, 1);
        assert!(!sink
            .tasks()
            .iter()
            .any(|t| t.tokens.contains(&"-m".to_string())));

        let mut args = base_args();
        args.insert("msks", Value::from("raw-masks"));
        let commands = configure(&args, &SettingsMap::new());
        let sink = emit_all(&commands, 1);
        let with_masks: Vec<_> = sink
            .tasks()
            .iter()
            .filter(|t| t.tokens.contains(&"-m".to_string()))
            .collect();
        // pre-merge and boundary-features both take masks.
        assert_eq!(with_masks.len(), 2);
        assert!(with_masks[0].inputs.contains(std::path::Path::new("msk/0000.mha")));
    }

    #[test]
    fn settings_file_value_reaches_the_task() {
        let mut settings = SettingsMap::new();
        settings.insert("level", Value::Float(0.75));
        settings.insert("saliency", Value::from("min"));
        let commands = configure(&base_args(), &settings);
        let sink = emit_all(&commands, 1);
        assert!(sink.tasks()[0].tokens.contains(&"0.75".to_string()));
        let mo = sink
            .tasks()
            .iter()
            .find(|t| t.tokens.first().is_some_and(|t| t.starts_with("merge-order")))
            .unwrap();
        // "min" is choice 1.
        let y = mo.tokens.iter().position(|t| t == "-y").unwrap();
        assert_eq!(mo.tokens[y + 1], "1");
    }
}
