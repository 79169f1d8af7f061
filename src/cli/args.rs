// src/cli/args.rs

use crate::constants::{ATTR_TEMP, SETTING_THREE_D};
use clap::{Arg, ArgAction, Command, crate_version};

/// Builds the driver's base flag set. Pipeline commands add their own
/// parameter flags on top of this through the flag registry, which is why
/// the builder API is used instead of the derive API.
pub fn base_command() -> Command {
    Command::new("sliceflow")
        .version(crate_version!())
        .about("Declarative task planner for per-slice and whole-stack segmentation pipelines")
        .arg(
            Arg::new("settings")
                .long("settings")
                .value_name("FILE")
                .help("TOML file with base setting values; typed flags override its entries"),
        )
        .arg(
            Arg::new(ATTR_TEMP)
                .long("temp")
                .value_name("DIR")
                .default_value(".")
                .help("Temporary working directory for intermediate files (created if missing)"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("FILE")
                .default_value("model.ssv")
                .help("Classifier model file, written when training and read when predicting"),
        )
        .arg(
            Arg::new("msks")
                .long("msks")
                .value_name("DIR")
                .help("Folder of mask images restricting processing to a region"),
        )
        .arg(
            Arg::new("truth")
                .long("truth")
                .value_name("DIR")
                .help("Folder of ground-truth labels; switches the run to classifier training"),
        )
        .arg(
            Arg::new("bc-order")
                .long("bc-order")
                .action(ArgAction::SetTrue)
                .help("Order merges by boundary classifier instead of boundary probability"),
        )
        .arg(
            Arg::new(SETTING_THREE_D)
                .long("threeD")
                .short('3')
                .action(ArgAction::SetTrue)
                .help("Treat the volume as one 3D file instead of a stack of 2D slices"),
        )
        .arg(
            Arg::new("slices")
                .long("slices")
                .short('n')
                .value_name("N")
                .default_value("1")
                .help("Number of slices in the stack"),
        )
        .arg(
            Arg::new("plan")
                .long("plan")
                .action(ArgAction::SetTrue)
                .help("Print the resolved task plan to the terminal"),
        )
        .arg(
            Arg::new("manifest")
                .long("manifest")
                .value_name("FILE")
                .help("Write the resolved tasks as a JSON manifest to FILE"),
        )
        .arg(
            Arg::new("rusage")
                .long("rusage")
                .value_name("FILE")
                .help("Append resource usage records to FILE (disabled if not writable)"),
        )
}
