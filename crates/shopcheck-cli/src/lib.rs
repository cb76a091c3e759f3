//! Shopcheck CLI library
//!
//! Argument parsing, configuration layering and command handlers for the
//! `shopcheck` binary.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ConfigFormat, LayoutArg, LogFormat, ResetArgs, RunArgs,
    SelectorsArgs,
};
pub use config::{load_suite_config, CliConfig, ColorChoice, FlagOverrides, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_tracing;
pub use output::Reporter;
