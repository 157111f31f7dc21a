//! Tolerador CLI Library
//!
//! Command-line interface for the Tolerar scenario runner.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)] // String building is clear and correct
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
pub mod runner;

pub use commands::{Cli, ColorArg, Commands, FormatArg, ListArgs, RunArgs, ValidateArgs};
pub use config::{CliConfig, ColorChoice, RunSettings, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_listing, OutputFormat, ProgressReporter, ScenarioSummary};
pub use runner::{RunPlan, ScenarioSource};
