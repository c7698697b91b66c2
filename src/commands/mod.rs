//! One-shot CLI commands that talk to the running daemon.

pub mod control;
pub mod help;
pub mod status;

pub use control::{ControlCommand, handle_control_command};
