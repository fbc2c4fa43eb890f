//! SnapDraft application shell.
//!
//! Drives a [`snapdraft_core::Canvas`] without a window: inspect a drawing,
//! query the snap engine at a point, or replay a scripted session.

mod cli;
mod script;

pub use cli::{CliArgs, Command, run};
pub use script::{ScriptCommand, Session, parse_script};
