//! CLI module for devbar
//!
//! Inspect and edit a persisted toolbar store from a shell: list, set and
//! clear overrides, read and patch view state, dump the raw snapshot.

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, DEFAULT_DIR};
pub use commands::{execute, parse_value, resolve_config, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{print_result, write_result};
