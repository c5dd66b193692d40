//! Tooling & Integration Layer
//!
//! The `agt` command line: argument parsing, prompts and rendering. The core
//! modules never prompt; decisions reach them as options.

pub mod cli;
pub mod format;
pub mod prompt;

pub use cli::{Cli, CliContext, CommandOutput, Commands, ConfigCommands};
