//! Library side of the `warden` binary: subcommand bodies, local policy files and event
//! rendering. `main.rs` only parses arguments, loads configuration and wires backends.

pub mod commands;
pub mod display;
pub mod policy_file;

pub use commands::{
    decide, evaluate, governance, watch, watch_subscription, CliError, EvaluateReport,
};
pub use display::{format_approval, format_event, truncate_display, DEFAULT_MAX_LEN};
pub use policy_file::{PolicyFile, PolicyFileError};
