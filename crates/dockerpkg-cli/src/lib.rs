//! dockerpkg CLI library.
//!
//! This crate provides the command dispatcher for the `dockerpkg` binary:
//! argument parsing, one handler per subcommand, output rendering, and
//! terminal styling.

pub mod cli;
pub mod commands;
pub mod connect;
pub mod output;
pub mod terminal;
