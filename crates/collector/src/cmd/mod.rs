//! Subcommands

pub mod check;
pub mod replay;
