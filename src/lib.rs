//! Reconciles each Python module's declared `__all__` export list with how
//! the module is actually imported and referenced across a source tree.

pub mod analysis;
pub mod config;
pub mod core;
pub mod domain;
pub mod lexer;
pub mod parser;

pub use analysis::{run, RunOptions, RunOutcome};
pub use config::Config;
