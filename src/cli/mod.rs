pub mod args;
pub mod commands;

pub use args::{BoundsArgs, Cli, Commands};
pub use commands::run;
