//! CLI command implementations

pub mod exec;
pub mod render;
pub mod repl;
