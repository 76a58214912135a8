mod args;
pub mod commands;
mod plan;

pub use self::args::{Cli, Commands};
