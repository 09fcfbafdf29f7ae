//! Command-line interface module.

mod args;
pub mod resolve;
pub mod source;
pub mod worker;

pub use args::{Cli, Commands, ResolveArgs};
