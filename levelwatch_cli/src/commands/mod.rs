//! CLI subcommand implementations.

pub mod check;
pub mod classes;
pub mod serve;
