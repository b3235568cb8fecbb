//! Taxonomy Images CLI
//!
//! Drives the association layer against a JSON host snapshot, for
//! inspecting data and scripting fixes outside a running site.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cli;
pub mod commands;
pub mod state;

pub use cli::command;
pub use commands::{execute, run, Outcome};
pub use state::StateFile;
