// src/bin/sliceflow.rs

use colored::Colorize;
use sliceflow::cli;
use sliceflow::core::argument::ConfigError;
use sliceflow::system::manifest::ManifestError;

fn main() {
    env_logger::init();

    if let Err(error) = cli::run() {
        if error.downcast_ref::<ConfigError>().is_some() {
            eprintln!("\n{} {error:#}", "Configuration error:".red().bold());
            std::process::exit(2);
        }
        if error.downcast_ref::<ManifestError>().is_some() {
            eprintln!("\n{} {error:#}", "Manifest error:".red().bold());
            std::process::exit(3);
        }
        eprintln!("\n{} {error:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}
