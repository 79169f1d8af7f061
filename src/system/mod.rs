//! # Executor Boundary
//!
//! Task sinks handed to `Cmd::add_tasks`. Everything past this boundary
//! (scheduling, caching, process execution) belongs to the external
//! executor; this layer only hands over fully-resolved task records.
//!
//! - **`plan`**: dry-run sink that renders the collected tasks as a
//!   colored, shell-quoted plan on the terminal.
//! - **`manifest`**: sink that serializes the collected tasks to a JSON
//!   manifest file for the external executor to consume.

pub mod manifest;
pub mod plan;
